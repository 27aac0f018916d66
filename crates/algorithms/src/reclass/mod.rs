//! Discretization of continuous rasters
//!
//! - Integer truncation (slope degrees → whole degrees)
//! - Range reclassification into ordinal classes

mod integer;
mod reclassify;

pub use integer::truncate_to_int;
pub use reclassify::{reclassify, Bounds, ReclassEntry, ReclassifyParams, CLASS_NODATA};
