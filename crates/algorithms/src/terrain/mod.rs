//! Terrain analysis algorithms
//!
//! Algorithms for analyzing Digital Elevation Models (DEMs):
//! - Slope: rate of change of elevation
//! - Aspect: direction of steepest descent
//! - Hillshade: shaded relief visualization
//! - Contour: contour polylines at a fixed interval

mod aspect;
mod contour;
mod hillshade;
mod slope;
mod window;

pub use aspect::{aspect, AspectOutput, FLAT_ASPECT};
pub use contour::{contour_lines, ContourParams};
pub use hillshade::{hillshade, HillshadeParams};
pub use slope::{slope, SlopeParams, SlopeUnits};
pub use window::EdgeHandling;
