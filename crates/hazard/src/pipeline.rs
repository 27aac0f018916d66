//! Hazard Raster Pipeline
//!
//! slope → integer degrees → two-class reclassify → polygons → filter.
//! The classes are `[0, T] → 1` and `(T, 90] → high_class`; only polygons
//! of the high class whose area exceeds `min_area` survive the filter.

use geo::MultiPolygon;
use geohaz_algorithms::reclass::ReclassifyParams;
use geohaz_algorithms::vector::PolygonizeParams;
use geohaz_core::raster::Raster;
use geohaz_core::vector::{FeatureCollection, Predicate};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::engine::Engine;
use crate::error::{HazardError, Result};

/// Attribute holding the slope class of each polygon
pub const GRIDCODE_FIELD: &str = "gridcode";
/// Attribute holding each polygon's area in CRS units squared
pub const AREA_FIELD: &str = "Shape_Area";
/// Class of cells at or below the threshold
pub const LOW_CLASS: i32 = 1;

/// Parameters shared by every slope hazard run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Class assigned to slopes above the threshold, and kept by the filter
    pub high_class: i32,
    /// Polygons must be strictly larger than this to be kept
    pub min_area: f64,
    /// Douglas-Peucker tolerance applied to polygon boundaries
    pub simplify_tolerance: f64,
    /// Elevation multiplier used when computing slope
    pub slope_z_factor: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            high_class: 2,
            min_area: 1000.0,
            simplify_tolerance: 0.0,
            slope_z_factor: 1.0,
        }
    }
}

impl PipelineConfig {
    fn validate(&self) -> Result<()> {
        if self.high_class == LOW_CLASS {
            return Err(HazardError::Config(format!(
                "high class must differ from the low class {LOW_CLASS}"
            )));
        }
        if !self.min_area.is_finite() || self.min_area < 0.0 {
            return Err(HazardError::Config(format!("min_area must be >= 0, got {}", self.min_area)));
        }
        Ok(())
    }

    /// Selection keeping high-class polygons above the minimum area
    pub fn hazard_filter(&self) -> Predicate {
        Predicate::equals(GRIDCODE_FIELD, i64::from(self.high_class)).and(Predicate::gt(AREA_FIELD, self.min_area))
    }

    fn polygonize_params(&self) -> PolygonizeParams {
        PolygonizeParams {
            value_field: GRIDCODE_FIELD.to_string(),
            area_field: Some(AREA_FIELD.to_string()),
            simplify_tolerance: self.simplify_tolerance,
        }
    }
}

/// Every artifact of one pipeline run
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// Slope truncated to whole degrees
    pub integer: Raster<i32>,
    /// Two-class slope raster
    pub classes: Raster<i32>,
    /// All class polygons before filtering
    pub polygons: FeatureCollection,
    /// Polygons passing the hazard filter
    pub hazards: FeatureCollection,
}

/// Classify an existing slope raster (degrees) into hazard polygons.
pub fn classify_slope<E: Engine + ?Sized>(
    engine: &E,
    slope: &Raster<f64>,
    threshold: f64,
    config: &PipelineConfig,
) -> Result<PipelineOutput> {
    config.validate()?;
    let reclass = ReclassifyParams::slope_split(threshold, LOW_CLASS, config.high_class)?;

    let integer = engine.to_integer(slope)?;
    let classes = engine.reclassify(&integer, &reclass)?;
    let polygons = engine.polygonize(&classes, &config.polygonize_params())?;

    let filter = config.hazard_filter();
    let hazards = polygons.select(&filter);
    debug!(
        threshold,
        polygons = polygons.len(),
        hazards = hazards.len(),
        filter = %filter,
        "classified slope raster"
    );

    Ok(PipelineOutput {
        integer,
        classes,
        polygons,
        hazards,
    })
}

/// Hazard polygons of slopes steeper than `threshold` degrees.
///
/// An empty result is a valid "no hazard" outcome.
pub fn slope_hazard<E: Engine + ?Sized>(
    engine: &E,
    dem: &Raster<f64>,
    threshold: f64,
    config: &PipelineConfig,
) -> Result<FeatureCollection> {
    let slope = engine.slope(dem, config.slope_z_factor)?;
    Ok(classify_slope(engine, &slope, threshold, config)?.hazards)
}

/// Run the pipeline on the part of `slope` covered by `mask`.
pub fn formation_hazard<E: Engine + ?Sized>(
    engine: &E,
    slope: &Raster<f64>,
    mask: &MultiPolygon<f64>,
    threshold: f64,
    config: &PipelineConfig,
) -> Result<PipelineOutput> {
    let clipped = engine.clip(slope, mask, false)?;
    classify_slope(engine, &clipped, threshold, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::NativeEngine;
    use approx::assert_relative_eq;
    use geohaz_core::vector::AttributeValue;
    use geohaz_core::GeoTransform;

    fn slope_raster(values: Vec<f64>, rows: usize, cols: usize, cell: f64) -> Raster<f64> {
        let mut r = Raster::from_vec(values, rows, cols).unwrap();
        r.set_transform(GeoTransform::new(0.0, rows as f64 * cell, cell, -cell));
        r
    }

    #[test]
    fn test_threshold_value_is_low_class() {
        // Left half exactly 30°, right half 31°
        let values: Vec<f64> = (0..100).map(|i| if i % 10 < 5 { 30.0 } else { 31.0 }).collect();
        let slope = slope_raster(values, 10, 10, 20.0);
        let out = classify_slope(&NativeEngine::new(), &slope, 30.0, &PipelineConfig::default()).unwrap();

        assert_eq!(out.classes.get(0, 0).unwrap(), 1);
        assert_eq!(out.classes.get(0, 9).unwrap(), 2);
        assert_eq!(out.polygons.len(), 2);
        assert_eq!(out.hazards.len(), 1);
        let f = &out.hazards.features[0];
        assert_eq!(f.get_property(GRIDCODE_FIELD), Some(&AttributeValue::Int(2)));
        assert_relative_eq!(f.get_property(AREA_FIELD).unwrap().as_f64().unwrap(), 50.0 * 400.0);
    }

    #[test]
    fn test_fractional_slopes_truncate_before_classifying() {
        // 30.9° truncates to 30 and stays low
        let slope = slope_raster(vec![30.9; 16], 4, 4, 20.0);
        let out = classify_slope(&NativeEngine::new(), &slope, 30.0, &PipelineConfig::default()).unwrap();
        assert!(out.hazards.is_empty());
        assert!(out.classes.data().iter().all(|&c| c == LOW_CLASS));
    }

    #[test]
    fn test_small_polygons_filtered() {
        // One steep cell of 100 m² is below the 1000 m² minimum
        let mut values = vec![10.0; 25];
        values[12] = 45.0;
        let slope = slope_raster(values, 5, 5, 10.0);
        let out = classify_slope(&NativeEngine::new(), &slope, 30.0, &PipelineConfig::default()).unwrap();
        assert_eq!(out.polygons.len(), 2);
        assert!(out.hazards.is_empty());

        let lenient = PipelineConfig { min_area: 50.0, ..Default::default() };
        let out = classify_slope(&NativeEngine::new(), &slope, 30.0, &lenient).unwrap();
        assert_eq!(out.hazards.len(), 1);
    }

    #[test]
    fn test_filter_expression() {
        assert_eq!(
            PipelineConfig::default().hazard_filter().to_string(),
            "gridcode = 2 AND Shape_Area > 1000"
        );
    }

    #[test]
    fn test_invalid_config() {
        let slope = slope_raster(vec![10.0; 4], 2, 2, 10.0);
        let config = PipelineConfig { high_class: 1, ..Default::default() };
        assert!(matches!(
            classify_slope(&NativeEngine::new(), &slope, 30.0, &config),
            Err(HazardError::Config(_))
        ));
        assert!(classify_slope(&NativeEngine::new(), &slope, 95.0, &PipelineConfig::default()).is_err());
    }
}
