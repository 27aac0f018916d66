//! Axis-aligned extents of rasters and masks

use geo::{BoundingRect, Geometry, MultiPolygon, Rect};
use geohaz_core::raster::{Raster, RasterElement};

/// Axis-aligned extent in map units
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self { min_x, min_y, max_x, max_y }
    }

    /// Full extent of a raster grid
    pub fn of_raster<T: RasterElement>(raster: &Raster<T>) -> Self {
        let (min_x, min_y, max_x, max_y) = raster.bounds();
        Self::new(min_x, min_y, max_x, max_y)
    }

    /// Extent of a mask; `None` when it holds no polygons
    pub fn of_mask(mask: &MultiPolygon<f64>) -> Option<Self> {
        mask.bounding_rect().map(Self::from)
    }

    /// Inclusive of the box edges
    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        (self.min_x..=self.max_x).contains(&x) && (self.min_y..=self.max_y).contains(&y)
    }

    /// Overlap of two boxes; `None` when they are disjoint or only share an edge
    pub fn intersection(&self, other: &BoundingBox) -> Option<BoundingBox> {
        let b = BoundingBox::new(
            self.min_x.max(other.min_x),
            self.min_y.max(other.min_y),
            self.max_x.min(other.max_x),
            self.max_y.min(other.max_y),
        );
        (b.max_x > b.min_x && b.max_y > b.min_y).then_some(b)
    }
}

impl From<Rect<f64>> for BoundingBox {
    fn from(rect: Rect<f64>) -> Self {
        Self::new(rect.min().x, rect.min().y, rect.max().x, rect.max().y)
    }
}

/// Extent of a geometry; `None` for empty geometries
pub fn bounding_box(geom: &Geometry<f64>) -> Option<BoundingBox> {
    geom.bounding_rect().map(BoundingBox::from)
}
