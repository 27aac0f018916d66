//! # GeoHaz Algorithms
//!
//! Raster and vector building blocks of the hazard workflows.
//!
//! ## Algorithm Categories
//!
//! - **terrain**: slope, aspect, hillshade, contour lines
//! - **reclass**: integer truncation, range reclassification
//! - **vector**: polygonize, clip by mask, buffer, simplify, measurements

mod maybe_rayon;

pub mod reclass;
pub mod terrain;
pub mod vector;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::reclass::{reclassify, truncate_to_int, ReclassEntry, ReclassifyParams, CLASS_NODATA};
    pub use crate::terrain::{
        aspect, contour_lines, hillshade, slope, AspectOutput, ContourParams, EdgeHandling, HillshadeParams,
        SlopeParams, SlopeUnits,
    };
    pub use crate::vector::{
        buffer_polygon, clip_to_mask, mask_from_geometries, polygonize, BufferParams, ClipParams,
        PolygonizeParams,
    };
    pub use geohaz_core::prelude::*;
}
