//! Raster/vector engine seam
//!
//! Hazard workflows sequence engine operations but never compute slope,
//! reclassification or vectorization themselves. [`NativeEngine`] runs the
//! `geohaz-algorithms` kernels; tests substitute engines that fail on demand.

use geo::{MultiPolygon, Polygon};
use geohaz_algorithms::reclass::{self, ReclassifyParams};
use geohaz_algorithms::terrain::{self, AspectOutput, ContourParams, EdgeHandling, HillshadeParams, SlopeParams, SlopeUnits};
use geohaz_algorithms::vector::{self, BufferParams, ClipParams, PolygonizeParams};
use geohaz_core::raster::Raster;
use geohaz_core::vector::FeatureCollection;

use crate::error::Result;

/// Operations delegated to a geometry/raster engine
pub trait Engine {
    /// Slope in degrees
    fn slope(&self, dem: &Raster<f64>, z_factor: f64) -> Result<Raster<f64>>;

    /// Truncate cell values toward zero
    fn to_integer(&self, raster: &Raster<f64>) -> Result<Raster<i32>>;

    fn reclassify(&self, raster: &Raster<i32>, params: &ReclassifyParams) -> Result<Raster<i32>>;

    fn polygonize(&self, raster: &Raster<i32>, params: &PolygonizeParams) -> Result<FeatureCollection>;

    /// Restrict a raster to the cells inside `mask`
    fn clip(&self, raster: &Raster<f64>, mask: &MultiPolygon<f64>, maintain_extent: bool) -> Result<Raster<f64>>;

    fn buffer(&self, polygon: &Polygon<f64>, distance: f64) -> Result<Polygon<f64>>;

    fn hillshade(&self, dem: &Raster<f64>) -> Result<Raster<f64>>;

    /// Aspect in degrees clockwise from north
    fn aspect(&self, dem: &Raster<f64>) -> Result<Raster<f64>>;

    fn contours(&self, dem: &Raster<f64>, interval: f64) -> Result<FeatureCollection>;
}

/// Engine backed by the in-process algorithm kernels
#[derive(Debug, Clone, Default)]
pub struct NativeEngine {
    /// Border treatment of the 3x3 terrain kernels
    pub edges: EdgeHandling,
}

impl NativeEngine {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Engine for NativeEngine {
    fn slope(&self, dem: &Raster<f64>, z_factor: f64) -> Result<Raster<f64>> {
        let params = SlopeParams {
            units: SlopeUnits::Degrees,
            z_factor,
            edges: self.edges,
        };
        Ok(terrain::slope(dem, &params)?)
    }

    fn to_integer(&self, raster: &Raster<f64>) -> Result<Raster<i32>> {
        Ok(reclass::truncate_to_int(raster)?)
    }

    fn reclassify(&self, raster: &Raster<i32>, params: &ReclassifyParams) -> Result<Raster<i32>> {
        Ok(reclass::reclassify(raster, params)?)
    }

    fn polygonize(&self, raster: &Raster<i32>, params: &PolygonizeParams) -> Result<FeatureCollection> {
        Ok(vector::polygonize(raster, params)?)
    }

    fn clip(&self, raster: &Raster<f64>, mask: &MultiPolygon<f64>, maintain_extent: bool) -> Result<Raster<f64>> {
        Ok(vector::clip_to_mask(raster, mask, &ClipParams { maintain_extent })?)
    }

    fn buffer(&self, polygon: &Polygon<f64>, distance: f64) -> Result<Polygon<f64>> {
        Ok(vector::buffer_polygon(polygon, &BufferParams::new(distance))?)
    }

    fn hillshade(&self, dem: &Raster<f64>) -> Result<Raster<f64>> {
        Ok(terrain::hillshade(dem, &HillshadeParams::default())?)
    }

    fn aspect(&self, dem: &Raster<f64>) -> Result<Raster<f64>> {
        Ok(terrain::aspect(dem, AspectOutput::Degrees)?)
    }

    fn contours(&self, dem: &Raster<f64>, interval: f64) -> Result<FeatureCollection> {
        let params = ContourParams {
            interval,
            ..Default::default()
        };
        Ok(terrain::contour_lines(dem, &params)?)
    }
}
