//! Formation-specific landslide slope hazard
//!
//! Each configured formation gets its own slope threshold. The slope raster
//! is computed once, clipped to the formation's outcrop polygons, run
//! through the hazard pipeline, and the surviving polygons are appended to
//! one accumulating collection tagged with the formation code and a hazard
//! label. A formation pass that fails is recorded in the report and the run
//! moves on to the next formation.

use std::path::Path;

use geohaz_algorithms::vector::mask_from_geometries;
use geohaz_core::raster::Raster;
use geohaz_core::vector::{AttributeValue, FeatureCollection, Predicate};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::classifier::DEFAULT_UNIT_FIELD;
use crate::engine::Engine;
use crate::error::{HazardError, Result};
use crate::pipeline::{formation_hazard, PipelineConfig, PipelineOutput};

/// Attribute receiving the source formation code
pub const FORMATION_FIELD: &str = "fmt";
/// Attribute receiving the hazard label
pub const HAZARD_TYPE_FIELD: &str = "Hazard_Type";

/// Slope threshold for one formation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormationThreshold {
    /// Formation code, matched exactly
    pub code: String,
    /// Slope boundary in degrees
    pub threshold: f64,
}

impl FormationThreshold {
    pub fn new(code: impl Into<String>, threshold: f64) -> Self {
        Self {
            code: code.into(),
            threshold,
        }
    }
}

/// Formation profile of a landslide run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LandslideConfig {
    /// Formations in processing order
    pub formations: Vec<FormationThreshold>,
    /// Value written to `Hazard_Type`
    #[serde(default = "default_label")]
    pub hazard_label: String,
    /// Geology attribute holding formation codes
    #[serde(default = "default_field")]
    pub field: String,
}

fn default_label() -> String {
    "Landslide Hazard".to_string()
}

fn default_field() -> String {
    DEFAULT_UNIT_FIELD.to_string()
}

impl LandslideConfig {
    /// Summit County profile: Maroon Formation above 25°, Minturn Formation above 27.5°.
    pub fn summit_county() -> Self {
        Self {
            formations: vec![FormationThreshold::new("PPm", 25.0), FormationThreshold::new("Pm", 27.5)],
            hazard_label: default_label(),
            field: default_field(),
        }
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        let config: LandslideConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_json_str(&std::fs::read_to_string(path)?)
    }

    fn validate(&self) -> Result<()> {
        for f in &self.formations {
            if f.code.trim().is_empty() {
                return Err(HazardError::Config("formation code must not be empty".into()));
            }
            if !(0.0..90.0).contains(&f.threshold) {
                return Err(HazardError::Config(format!(
                    "threshold for {} must be in [0, 90) degrees, got {}",
                    f.code, f.threshold
                )));
            }
        }
        Ok(())
    }
}

impl Default for LandslideConfig {
    fn default() -> Self {
        Self::summit_county()
    }
}

/// Result of one formation pass
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FormationOutcome {
    /// Pass completed; `polygons` hazard polygons were appended (possibly zero)
    Mapped { polygons: usize },
    /// The formation does not occur among the classified landslide units
    NotPresent,
    /// An engine operation failed during the pass
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormationReport {
    pub code: String,
    pub threshold: f64,
    pub outcome: FormationOutcome,
}

/// Per-formation outcomes of a landslide run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LandslideReport {
    pub formations: Vec<FormationReport>,
}

impl LandslideReport {
    pub fn failures(&self) -> impl Iterator<Item = &FormationReport> {
        self.formations
            .iter()
            .filter(|r| matches!(r.outcome, FormationOutcome::Failed { .. }))
    }

    pub fn mapped_polygons(&self) -> usize {
        self.formations
            .iter()
            .map(|r| match r.outcome {
                FormationOutcome::Mapped { polygons } => polygons,
                _ => 0,
            })
            .sum()
    }
}

/// Accumulated hazard polygons plus the per-formation report
#[derive(Debug, Clone)]
pub struct LandslideOutput {
    pub hazards: FeatureCollection,
    pub report: LandslideReport,
    /// Slope of the whole DEM, in degrees
    pub slope: Raster<f64>,
    /// Pipeline artifacts of each mapped formation, keyed by formation code.
    /// `hazards` of each entry is the batch before appending and tagging.
    pub batches: Vec<(String, PipelineOutput)>,
}

/// Append `batch` to `target` and tag every row whose formation is still null.
///
/// Rows tagged by earlier batches keep their values. Returns the number of
/// rows tagged.
pub fn append_tagged(target: &mut FeatureCollection, batch: FeatureCollection, code: &str, label: &str) -> usize {
    target.add_field(FORMATION_FIELD);
    target.add_field(HAZARD_TYPE_FIELD);
    target.append(batch);

    let untagged = Predicate::is_null(FORMATION_FIELD);
    let mut tagged = 0;
    for feature in target.iter_mut() {
        if untagged.matches(feature) {
            feature.set_property(FORMATION_FIELD, code);
            feature.set_property(HAZARD_TYPE_FIELD, label);
            tagged += 1;
        }
    }
    tagged
}

/// Map landslide slope hazard for each configured formation.
///
/// `units` is the landslide list of the unit classification; formations
/// missing from it are reported as [`FormationOutcome::NotPresent`]. Slope
/// failures abort the run since no formation could be processed.
pub fn landslide_hazard<E: Engine + ?Sized>(
    engine: &E,
    dem: &Raster<f64>,
    geology: &FeatureCollection,
    units: &[String],
    config: &LandslideConfig,
    pipeline: &PipelineConfig,
) -> Result<LandslideOutput> {
    config.validate()?;
    if !geology.is_empty() && !geology.has_field(&config.field) {
        return Err(HazardError::MissingField {
            field: config.field.clone(),
            dataset: "geology features".to_string(),
        });
    }

    let slope = engine.slope(dem, pipeline.slope_z_factor)?;

    let mut hazards = FeatureCollection::new();
    hazards.crs = geology.crs.clone().or_else(|| dem.crs().cloned());
    let mut report = LandslideReport::default();
    let mut batches = Vec::new();

    for formation in &config.formations {
        let outcome = if !units.iter().any(|u| *u == formation.code) {
            info!(formation = %formation.code, "formation not present, skipping");
            FormationOutcome::NotPresent
        } else {
            let outcrop = geology.select(&Predicate::equals(&config.field, formation.code.as_str()));
            let mask = mask_from_geometries(outcrop.iter().filter_map(|f| f.geometry.as_ref()));

            match formation_hazard(engine, &slope, &mask, formation.threshold, pipeline) {
                Ok(output) => {
                    let count = output.hazards.len();
                    append_tagged(&mut hazards, output.hazards.clone(), &formation.code, &config.hazard_label);
                    batches.push((formation.code.clone(), output));
                    info!(
                        formation = %formation.code,
                        threshold = formation.threshold,
                        polygons = count,
                        "mapped formation"
                    );
                    FormationOutcome::Mapped { polygons: count }
                }
                Err(e) => {
                    warn!(formation = %formation.code, error = %e, "formation pass failed");
                    FormationOutcome::Failed { error: e.to_string() }
                }
            }
        };

        report.formations.push(FormationReport {
            code: formation.code.clone(),
            threshold: formation.threshold,
            outcome,
        });
    }

    // Keep the schema stable even when nothing was mapped
    hazards.add_field(FORMATION_FIELD);
    hazards.add_field(HAZARD_TYPE_FIELD);

    Ok(LandslideOutput {
        hazards,
        report,
        slope,
        batches,
    })
}

/// Formation codes of `hazards` rows, in row order
pub fn formation_codes(hazards: &FeatureCollection) -> Vec<Option<&str>> {
    hazards
        .iter()
        .map(|f| match f.get_property(FORMATION_FIELD) {
            Some(AttributeValue::String(s)) => Some(s.as_str()),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{Geometry, Point};
    use geohaz_core::vector::Feature;

    fn row(gridcode: i64) -> Feature {
        Feature::new(Geometry::Point(Point::new(0.0, 0.0)))
            .with_property("gridcode", gridcode)
            .with_property("Shape_Area", 5000.0)
    }

    fn batch(n: usize) -> FeatureCollection {
        (0..n).map(|_| row(2)).collect()
    }

    #[test]
    fn test_append_tags_only_new_rows() {
        let mut target = FeatureCollection::new();
        assert_eq!(append_tagged(&mut target, batch(2), "PPm", "Landslide Hazard"), 2);
        assert_eq!(append_tagged(&mut target, batch(3), "Pm", "Landslide Hazard"), 3);

        assert_eq!(
            formation_codes(&target),
            vec![Some("PPm"), Some("PPm"), Some("Pm"), Some("Pm"), Some("Pm")]
        );
        assert!(target.iter().all(|f| f.get_str(HAZARD_TYPE_FIELD) == Some("Landslide Hazard")));
    }

    #[test]
    fn test_append_empty_batch() {
        let mut target = FeatureCollection::new();
        assert_eq!(append_tagged(&mut target, FeatureCollection::new(), "PPm", "x"), 0);
        assert!(target.has_field(FORMATION_FIELD));
        assert!(target.is_empty());
    }

    #[test]
    fn test_summit_profile_and_json() {
        let summit = LandslideConfig::summit_county();
        assert_eq!(summit.formations[0], FormationThreshold::new("PPm", 25.0));
        assert_eq!(summit.formations[1], FormationThreshold::new("Pm", 27.5));
        assert_eq!(summit.field, "FMT");

        let parsed = LandslideConfig::from_json_str(r#"{"formations": [{"code": "Qls", "threshold": 20}]}"#).unwrap();
        assert_eq!(parsed.hazard_label, "Landslide Hazard");
        assert_eq!(parsed.field, "FMT");

        let bad = r#"{"formations": [{"code": "Qls", "threshold": 120}]}"#;
        assert!(matches!(LandslideConfig::from_json_str(bad), Err(HazardError::Config(_))));
    }

    #[test]
    fn test_report_helpers() {
        let report = LandslideReport {
            formations: vec![
                FormationReport { code: "PPm".into(), threshold: 25.0, outcome: FormationOutcome::Mapped { polygons: 4 } },
                FormationReport { code: "Pm".into(), threshold: 27.5, outcome: FormationOutcome::Failed { error: "boom".into() } },
                FormationReport { code: "Qls".into(), threshold: 20.0, outcome: FormationOutcome::NotPresent },
            ],
        };
        assert_eq!(report.mapped_polygons(), 4);
        assert_eq!(report.failures().count(), 1);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["formations"][1]["outcome"]["status"], "failed");
    }
}
