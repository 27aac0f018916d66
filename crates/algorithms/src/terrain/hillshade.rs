//! Hillshade (shaded relief) calculation
//!
//! Creates a shaded relief visualization from a DEM based on
//! illumination angle and direction.

use crate::maybe_rayon::*;
use crate::terrain::aspect::descent_bearing;
use crate::terrain::window::{horn_gradient, EdgeHandling};
use geohaz_core::raster::Raster;
use geohaz_core::{Error, Result};

/// Parameters for hillshade calculation
#[derive(Debug, Clone)]
pub struct HillshadeParams {
    /// Sun azimuth in degrees (0 = North, clockwise)
    pub azimuth: f64,
    /// Sun altitude in degrees above horizon (0-90)
    pub altitude: f64,
    /// Z-factor for vertical exaggeration
    pub z_factor: f64,
}

impl Default for HillshadeParams {
    fn default() -> Self {
        Self {
            azimuth: 315.0,
            altitude: 45.0,
            z_factor: 1.0,
        }
    }
}

/// Calculate hillshade (0-255) from a DEM.
///
/// shade = cos(zenith)·cos(slope) + sin(zenith)·sin(slope)·cos(azimuth − aspect),
/// with the aspect expressed as the compass bearing of descent.
/// No-data cells become 0, which is also the output no-data value.
pub fn hillshade(dem: &Raster<f64>, params: &HillshadeParams) -> Result<Raster<f64>> {
    if !(0.0..=90.0).contains(&params.altitude) {
        return Err(Error::InvalidParameter {
            name: "altitude",
            value: params.altitude.to_string(),
            reason: "must be between 0 and 90 degrees".into(),
        });
    }

    let (rows, cols) = dem.shape();
    let azimuth_rad = params.azimuth.rem_euclid(360.0).to_radians();
    let zenith_rad = (90.0 - params.altitude).to_radians();
    let (sin_zenith, cos_zenith) = zenith_rad.sin_cos();

    let output_data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            (0..cols)
                .map(|col| {
                    let Some(grad) =
                        horn_gradient(dem, row, col, params.z_factor, EdgeHandling::Extrapolate)
                    else {
                        return 0.0;
                    };
                    let slope_rad = grad.slope_rad();
                    let bearing = if grad.is_flat() {
                        0.0
                    } else {
                        descent_bearing(grad.dz_dx, grad.dz_dy)
                    };
                    let shade = cos_zenith * slope_rad.cos()
                        + sin_zenith * slope_rad.sin() * (azimuth_rad - bearing).cos();
                    (shade.clamp(0.0, 1.0) * 255.0).round()
                })
                .collect::<Vec<_>>()
        })
        .collect();

    dem.derive(output_data, Some(0.0))
}
