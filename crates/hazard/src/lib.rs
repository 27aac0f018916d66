//! # GeoHaz Hazard
//!
//! Geologic hazard mapping on top of the GeoHaz raster and vector kernels.
//!
//! - **classifier** / **catalog**: map geologic formation codes to rock,
//!   soil and landslide hazard lists with declarative substring rules
//! - **pipeline**: slope → integer → two-class reclassify → polygons → filter
//! - **landslide**: per-formation thresholds with an outcome report
//! - **tools**: rockfall, problematic soils and landslide exports
//! - **tiling**: LiDAR products per quadrangle within a county
//! - **workspace**: output naming and overwrite control
//!
//! ## Example
//!
//! ```ignore
//! use geohaz_hazard::{pipeline, NativeEngine, PipelineConfig};
//!
//! let hazards = pipeline::slope_hazard(&NativeEngine::new(), &dem, 30.0, &PipelineConfig::default())?;
//! ```

pub mod catalog;
pub mod classifier;
pub mod engine;
pub mod error;
pub mod landslide;
pub mod pipeline;
pub mod tiling;
pub mod tools;
pub mod workspace;

pub use catalog::{HazardCategory, HazardRule, RuleCatalog};
pub use classifier::{classify_units, distinct_units, UnitClassification, DEFAULT_UNIT_FIELD};
pub use engine::{Engine, NativeEngine};
pub use error::{HazardError, Result};
pub use landslide::{
    landslide_hazard, FormationOutcome, FormationReport, FormationThreshold, LandslideConfig, LandslideOutput,
    LandslideReport,
};
pub use pipeline::{formation_hazard, slope_hazard, PipelineConfig, PipelineOutput};
pub use tiling::{tile_quadrangles, CountyFilter, QuadOutcome, TilingConfig, TilingReport};
pub use workspace::{OutputWorkspace, WorkspaceConfig};
