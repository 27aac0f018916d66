//! Slope calculation from DEMs
//!
//! Rate of change of elevation from the Horn (1981) 3x3 gradient.

use crate::maybe_rayon::*;
use crate::terrain::window::{horn_gradient, EdgeHandling};
use geohaz_core::raster::Raster;
use geohaz_core::{Error, Result};

/// Units for slope output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SlopeUnits {
    /// Degrees (0-90)
    #[default]
    Degrees,
    /// Percent rise (0-infinity)
    Percent,
    /// Radians (0-π/2)
    Radians,
}

/// Parameters for slope calculation
#[derive(Debug, Clone)]
pub struct SlopeParams {
    /// Output units
    pub units: SlopeUnits,
    /// Multiplier applied to elevations before differencing, for DEMs whose
    /// z units differ from their ground units
    pub z_factor: f64,
    /// Treatment of border and no-data-adjacent cells
    pub edges: EdgeHandling,
}

impl Default for SlopeParams {
    fn default() -> Self {
        Self {
            units: SlopeUnits::Degrees,
            z_factor: 1.0,
            edges: EdgeHandling::Extrapolate,
        }
    }
}

/// Calculate slope from a DEM.
///
/// slope = atan(sqrt(dz/dx² + dz/dy²)), reported in `params.units`.
/// Cells without a gradient are NaN.
pub fn slope(dem: &Raster<f64>, params: &SlopeParams) -> Result<Raster<f64>> {
    if !(params.z_factor.is_finite() && params.z_factor > 0.0) {
        return Err(Error::InvalidParameter {
            name: "z_factor",
            value: params.z_factor.to_string(),
            reason: "must be a positive finite number".into(),
        });
    }

    let (rows, cols) = dem.shape();

    let output_data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            (0..cols)
                .map(|col| match horn_gradient(dem, row, col, params.z_factor, params.edges) {
                    Some(grad) => {
                        let slope_rad = grad.slope_rad();
                        match params.units {
                            SlopeUnits::Degrees => slope_rad.to_degrees(),
                            SlopeUnits::Percent => slope_rad.tan() * 100.0,
                            SlopeUnits::Radians => slope_rad,
                        }
                    }
                    None => f64::NAN,
                })
                .collect::<Vec<_>>()
        })
        .collect();

    dem.derive(output_data, Some(f64::NAN))
}
