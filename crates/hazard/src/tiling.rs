//! LiDAR quadrangle tiling
//!
//! Selects the quadrangles lying within a county, clips the LiDAR DEM to a
//! buffer around each one and derives hillshade, slope, aspect and contour
//! products per quadrangle. Buffer polygons are written alongside the
//! products and deleted once every quadrangle has been processed.

use std::path::PathBuf;

use geo::{Contains, MultiPolygon, Polygon};
use geohaz_algorithms::vector::mask_from_geometries;
use geohaz_core::raster::Raster;
use geohaz_core::vector::{Feature, FeatureCollection, Predicate};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::engine::Engine;
use crate::error::{HazardError, Result};
use crate::workspace::{suffix, truncate_name, ArtifactKind, OutputWorkspace};

/// One mile in meters
pub const MILE: f64 = 1609.344;

/// Characters of the quadrangle name kept in the clipped DEM name
const DEM_NAME_CHARS: usize = 9;
/// Characters of the quadrangle name kept in derived product names
const PRODUCT_NAME_CHARS: usize = 10;

/// Attribute filter selecting the county polygon(s)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountyFilter {
    pub field: String,
    pub value: String,
}

/// Parameters of the tiling run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TilingConfig {
    /// Buffer around each quadrangle, in CRS units
    pub buffer_distance: f64,
    pub contour_interval: f64,
    /// Quadrangle attribute holding the quad name
    pub name_field: String,
    /// Restrict the county layer to matching features; `None` uses all of it
    pub county: Option<CountyFilter>,
}

impl Default for TilingConfig {
    fn default() -> Self {
        Self {
            buffer_distance: MILE,
            contour_interval: 100.0,
            name_field: "quad_name".to_string(),
            county: None,
        }
    }
}

/// Result of tiling one quadrangle
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum QuadOutcome {
    Tiled { artifacts: Vec<PathBuf> },
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuadReport {
    pub name: String,
    pub outcome: QuadOutcome,
}

/// Per-quadrangle outcomes of a tiling run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TilingReport {
    pub quads: Vec<QuadReport>,
    /// Buffer artifacts deleted at the end of the run
    pub removed_buffers: Vec<PathBuf>,
}

impl TilingReport {
    pub fn tiled(&self) -> usize {
        self.quads
            .iter()
            .filter(|q| matches!(q.outcome, QuadOutcome::Tiled { .. }))
            .count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &QuadReport> {
        self.quads
            .iter()
            .filter(|q| matches!(q.outcome, QuadOutcome::Failed { .. }))
    }
}

fn polygons_of(feature: &Feature) -> Vec<Polygon<f64>> {
    mask_from_geometries(feature.geometry.as_ref()).0
}

/// Quadrangles whose polygons lie entirely within the county.
pub fn quads_within(quads: &FeatureCollection, county: &MultiPolygon<f64>) -> Vec<Feature> {
    quads
        .iter()
        .filter(|quad| {
            let parts = polygons_of(quad);
            !parts.is_empty() && parts.iter().all(|p| county.contains(p))
        })
        .cloned()
        .collect()
}

fn county_mask(county: &FeatureCollection, config: &TilingConfig) -> Result<MultiPolygon<f64>> {
    let selected = match &config.county {
        Some(filter) => county.select(&Predicate::equals(&filter.field, filter.value.as_str())),
        None => county.clone(),
    };
    let mask = mask_from_geometries(selected.iter().filter_map(|f| f.geometry.as_ref()));
    if mask.0.is_empty() {
        return Err(HazardError::Config("county layer has no matching polygons".into()));
    }
    Ok(mask)
}

fn tile_quad<E: Engine + ?Sized>(
    engine: &E,
    lidar: &Raster<f64>,
    name: &str,
    quad: &Feature,
    workspace: &OutputWorkspace,
    config: &TilingConfig,
) -> Result<Vec<PathBuf>> {
    let short = truncate_name(name, PRODUCT_NAME_CHARS);
    let product = |sfx: &str| format!("{short}{sfx}");

    let mut buffers = Vec::new();
    for part in polygons_of(quad) {
        buffers.push(engine.buffer(&part, config.buffer_distance)?);
    }
    let buffer = MultiPolygon::new(buffers);
    let mut buffer_fc = FeatureCollection::new();
    buffer_fc.push(Feature::new(buffer.clone().into()).with_property(config.name_field.clone(), name));
    workspace.write_features(&product(suffix::BUFFER), &buffer_fc)?;

    let dem = engine.clip(lidar, &buffer, false)?;
    let mut artifacts = vec![workspace.write_raster(
        &format!("{}{}", truncate_name(name, DEM_NAME_CHARS), suffix::DEM),
        &dem,
    )?];
    artifacts.push(workspace.write_raster(&product(suffix::HILLSHADE), &engine.hillshade(&dem)?)?);
    artifacts.push(workspace.write_raster(&product(suffix::SLOPE), &engine.slope(&dem, 1.0)?)?);
    artifacts.push(workspace.write_raster(&product(suffix::ASPECT), &engine.aspect(&dem)?)?);
    artifacts.push(workspace.write_features(
        &product(suffix::CONTOUR),
        &engine.contours(&dem, config.contour_interval)?,
    )?);
    Ok(artifacts)
}

/// Tile a LiDAR DEM by the quadrangles within a county.
///
/// A failing quadrangle is logged and reported; the run continues with the
/// next one. Configuration problems abort before any quadrangle is tiled.
pub fn tile_quadrangles<E: Engine + ?Sized>(
    engine: &E,
    lidar: &Raster<f64>,
    quads: &FeatureCollection,
    county: &FeatureCollection,
    workspace: &OutputWorkspace,
    config: &TilingConfig,
) -> Result<TilingReport> {
    if !quads.is_empty() && !quads.has_field(&config.name_field) {
        return Err(HazardError::MissingField {
            field: config.name_field.clone(),
            dataset: "quadrangle index".to_string(),
        });
    }
    if !(config.buffer_distance.is_finite() && config.buffer_distance >= 0.0) {
        return Err(HazardError::Config(format!(
            "buffer distance must be >= 0, got {}",
            config.buffer_distance
        )));
    }

    let county = county_mask(county, config)?;
    let selected = quads_within(quads, &county);
    info!(quads = selected.len(), of = quads.len(), "selected quadrangles within county");

    let mut report = TilingReport::default();
    for quad in &selected {
        let name = quad
            .get_property(&config.name_field)
            .map(|v| v.as_str().map(str::to_string).unwrap_or_else(|| v.to_string()))
            .unwrap_or_default();

        let outcome = match tile_quad(engine, lidar, &name, quad, workspace, config) {
            Ok(artifacts) => {
                debug!(quad = %name, artifacts = artifacts.len(), "tiled quadrangle");
                QuadOutcome::Tiled { artifacts }
            }
            Err(e) => {
                warn!(quad = %name, error = %e, "quadrangle failed");
                QuadOutcome::Failed { error: e.to_string() }
            }
        };
        report.quads.push(QuadReport { name, outcome });
    }

    report.removed_buffers = workspace.remove_matching(suffix::BUFFER, ArtifactKind::Features)?;
    info!(
        tiled = report.tiled(),
        failed = report.failures().count(),
        buffers_removed = report.removed_buffers.len(),
        "tiling finished"
    );
    Ok(report)
}
