//! Vector operations on hazard geometries
//!
//! - Polygonize: class raster → attributed polygons
//! - Clip by mask: restrict a raster to polygon coverage
//! - Buffer: outward zones around points and quadrangles
//! - Simplify: Douglas-Peucker on polygon rings
//! - Polygon area and bounding boxes

mod buffer;
mod mask;
mod measurements;
mod polygonize;
mod simplify;
mod spatial;

pub use buffer::{buffer_point, buffer_polygon, BufferParams};
pub use mask::{clip_to_mask, mask_from_geometries, ClipParams};
pub use measurements::area;
pub use polygonize::{polygonize, PolygonizeParams};
pub use simplify::simplify_dp;
pub use spatial::{bounding_box, BoundingBox};
