//! Aspect calculation from DEMs
//!
//! Direction of steepest descent from the Horn (1981) gradient.

use crate::maybe_rayon::*;
use crate::terrain::window::{horn_gradient, EdgeHandling};
use geohaz_core::raster::Raster;
use geohaz_core::Result;
use std::f64::consts::PI;

/// Value written for flat cells and cells without a gradient
pub const FLAT_ASPECT: f64 = -1.0;

/// Output format for aspect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AspectOutput {
    /// Degrees (0-360, 0=North, clockwise)
    #[default]
    Degrees,
    /// Compass sector (N, NE, E, SE, S, SW, W, NW) as 1-8
    Compass,
}

/// Compass bearing of steepest descent in radians, 0 = north, clockwise.
///
/// Descent in (east, north) space is (-dz/dx, dz/dy): pixel rows grow
/// southward, so the row derivative flips sign.
pub(crate) fn descent_bearing(dz_dx: f64, dz_dy: f64) -> f64 {
    let bearing = (-dz_dx).atan2(dz_dy);
    if bearing < 0.0 {
        bearing + 2.0 * PI
    } else {
        bearing
    }
}

fn compass_sector(degrees: f64) -> f64 {
    // Sectors are 45° wide and centered on the cardinal/intercardinal bearings
    (((degrees + 22.5) % 360.0 / 45.0).floor() + 1.0).min(8.0)
}

/// Calculate aspect from a DEM.
///
/// Flat cells are assigned [`FLAT_ASPECT`], which is also the output no-data value.
pub fn aspect(dem: &Raster<f64>, output_format: AspectOutput) -> Result<Raster<f64>> {
    let (rows, cols) = dem.shape();

    let output_data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            (0..cols)
                .map(|col| {
                    let grad = match horn_gradient(dem, row, col, 1.0, EdgeHandling::Extrapolate) {
                        Some(g) if !g.is_flat() => g,
                        _ => return FLAT_ASPECT,
                    };
                    let degrees = descent_bearing(grad.dz_dx, grad.dz_dy).to_degrees();
                    match output_format {
                        AspectOutput::Degrees => degrees,
                        AspectOutput::Compass => compass_sector(degrees),
                    }
                })
                .collect::<Vec<_>>()
        })
        .collect();

    dem.derive(output_data, Some(FLAT_ASPECT))
}
