//! The hazard derivative tools: rockfall, problematic soils, landslide
//! deposits and landslide slope hazard, each writing to an output workspace.

use std::path::PathBuf;

use geohaz_core::raster::Raster;
use geohaz_core::vector::{FeatureCollection, Predicate};
use tracing::info;

use crate::catalog::{HazardCategory, RuleCatalog};
use crate::classifier::{classify_units, distinct_units, UnitClassification};
use crate::engine::Engine;
use crate::error::Result;
use crate::landslide::{landslide_hazard, LandslideConfig, LandslideReport};
use crate::pipeline::{classify_slope, PipelineConfig};
use crate::workspace::{suffix, OutputWorkspace};

/// Slope boundary of the rockfall tool, in degrees
pub const ROCKFALL_THRESHOLD: f64 = 30.0;

/// Paths and counts written by the rockfall tool
#[derive(Debug, Clone)]
pub struct RockfallOutput {
    /// All slope-class polygons (`<name>_rf`)
    pub polygons: PathBuf,
    /// Filtered rockfall hazard polygons (`<name>_final`)
    pub hazards: PathBuf,
    pub hazard_count: usize,
}

/// Rockfall hazard: slopes steeper than 30° over areas larger than the minimum.
///
/// Intermediates are named after `dem_name`; outputs after `out_name`.
pub fn rockfall<E: Engine + ?Sized>(
    engine: &E,
    dem: &Raster<f64>,
    dem_name: &str,
    out_name: &str,
    workspace: &OutputWorkspace,
    config: &PipelineConfig,
) -> Result<RockfallOutput> {
    info!(dem = dem_name, threshold = ROCKFALL_THRESHOLD, "computing rockfall hazard");

    let slope = engine.slope(dem, config.slope_z_factor)?;
    workspace.write_scratch_raster(&format!("{dem_name}{}", suffix::SLOPE), &slope)?;

    let output = classify_slope(engine, &slope, ROCKFALL_THRESHOLD, config)?;
    workspace.write_scratch_raster(&format!("{dem_name}{}", suffix::INTEGER), &output.integer)?;
    workspace.write_scratch_raster(&format!("{dem_name}{}", suffix::RECLASS), &output.classes)?;

    let polygons = workspace.write_features(&format!("{out_name}{}", suffix::ROCKFALL), &output.polygons)?;
    let hazards = workspace.write_features(&format!("{out_name}{}", suffix::FINAL), &output.hazards)?;
    info!(polygons = output.polygons.len(), hazards = output.hazards.len(), "rockfall hazard written");

    Ok(RockfallOutput {
        polygons,
        hazards,
        hazard_count: output.hazards.len(),
    })
}

/// One exported category of geology features
#[derive(Debug, Clone)]
pub struct UnitExport {
    pub path: PathBuf,
    /// Matched formation codes
    pub units: Vec<String>,
    pub features: usize,
}

/// Geology features whose code is one of `units`.
///
/// One selection over all codes exports the same rows a code-by-code
/// cumulative selection would.
pub fn select_units(geology: &FeatureCollection, field: &str, units: &[String]) -> FeatureCollection {
    if units.is_empty() {
        return FeatureCollection {
            features: Vec::new(),
            fields: geology.fields.clone(),
            crs: geology.crs.clone(),
        };
    }
    geology.select(&Predicate::is_in(field, units.iter().map(String::as_str)))
}

fn export_category(
    geology: &FeatureCollection,
    dataset: &str,
    field: &str,
    classification: &UnitClassification,
    category: HazardCategory,
    out_name: &str,
    workspace: &OutputWorkspace,
) -> Result<UnitExport> {
    let units = classification.get(category).to_vec();
    if units.is_empty() {
        info!("{} has no problematic {}", dataset, category);
    }
    let selected = select_units(geology, field, &units);
    let path = workspace.write_features(out_name, &selected)?;
    info!(category = %category, units = units.len(), features = selected.len(), "exported units");
    Ok(UnitExport {
        path,
        units,
        features: selected.len(),
    })
}

/// Outputs of the problematic soils tool
#[derive(Debug, Clone)]
pub struct ProblematicSoilsOutput {
    pub classification: UnitClassification,
    pub rock: UnitExport,
    pub soil: UnitExport,
}

/// Export problematic rock and soil units of a geology map.
pub fn problematic_soils(
    geology: &FeatureCollection,
    dataset: &str,
    field: &str,
    catalog: &RuleCatalog,
    rock_name: &str,
    soil_name: &str,
    workspace: &OutputWorkspace,
) -> Result<ProblematicSoilsOutput> {
    let codes = distinct_units(geology, field)?;
    let classification = classify_units(&codes, catalog);

    let rock = export_category(geology, dataset, field, &classification, HazardCategory::Rock, rock_name, workspace)?;
    let soil = export_category(geology, dataset, field, &classification, HazardCategory::Soil, soil_name, workspace)?;

    Ok(ProblematicSoilsOutput {
        classification,
        rock,
        soil,
    })
}

/// Export landslide deposit units of a geology map.
pub fn landslide_units(
    geology: &FeatureCollection,
    dataset: &str,
    field: &str,
    catalog: &RuleCatalog,
    out_name: &str,
    workspace: &OutputWorkspace,
) -> Result<UnitExport> {
    let codes = distinct_units(geology, field)?;
    let classification = classify_units(&codes, catalog);
    export_category(
        geology,
        dataset,
        field,
        &classification,
        HazardCategory::Landslide,
        out_name,
        workspace,
    )
}

/// Outputs of the landslide slope hazard tool
#[derive(Debug, Clone)]
pub struct LandslideToolOutput {
    pub path: PathBuf,
    pub hazard_count: usize,
    pub report: LandslideReport,
}

/// Landslide slope hazard of a DEM over the formations of a geology map.
///
/// Writes `<dem>_LandslideHazards`. With a scratch directory, the slope goes
/// to `<dem>_sl` and each mapped formation leaves `<dem><code>_int`, `_rc`,
/// `_rtp` and its own batch `<dem><code>_LandslideHazards`.
#[allow(clippy::too_many_arguments)]
pub fn landslide<E: Engine + ?Sized>(
    engine: &E,
    dem: &Raster<f64>,
    dem_name: &str,
    geology: &FeatureCollection,
    catalog: &RuleCatalog,
    config: &LandslideConfig,
    pipeline: &PipelineConfig,
    workspace: &OutputWorkspace,
) -> Result<LandslideToolOutput> {
    let codes = distinct_units(geology, &config.field)?;
    let classification = classify_units(&codes, catalog);
    info!(dem = dem_name, units = ?classification.landslide, "computing landslide hazard");

    let output = landslide_hazard(engine, dem, geology, &classification.landslide, config, pipeline)?;
    workspace.write_scratch_raster(&format!("{dem_name}{}", suffix::SLOPE), &output.slope)?;
    for (code, artifacts) in &output.batches {
        let stem = format!("{dem_name}{code}");
        workspace.write_scratch_raster(&format!("{stem}{}", suffix::INTEGER), &artifacts.integer)?;
        workspace.write_scratch_raster(&format!("{stem}{}", suffix::RECLASS), &artifacts.classes)?;
        workspace.write_scratch_features(&format!("{stem}{}", suffix::POLYGONS), &artifacts.polygons)?;
        workspace.write_scratch_features(&format!("{stem}{}", suffix::LANDSLIDE), &artifacts.hazards)?;
    }

    let path = workspace.write_features(&format!("{dem_name}{}", suffix::LANDSLIDE), &output.hazards)?;
    Ok(LandslideToolOutput {
        path,
        hazard_count: output.hazards.len(),
        report: output.report,
    })
}
