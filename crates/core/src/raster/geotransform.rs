//! North-up georeferencing of raster grids

use serde::{Deserialize, Serialize};

/// Maps pixel space onto map coordinates for a north-up grid.
///
/// Pixel `(col, row)` has its upper-left corner at
/// `(origin_x + col * pixel_width, origin_y + row * pixel_height)`.
/// GeoTIFF tiepoint/scale georeferencing never carries rotation, so none is
/// modelled. `pixel_height` is negative when rows run southward.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoTransform {
    /// Map X of the grid's upper-left corner
    pub origin_x: f64,
    /// Map Y of the grid's upper-left corner
    pub origin_y: f64,
    pub pixel_width: f64,
    pub pixel_height: f64,
}

impl GeoTransform {
    pub fn new(origin_x: f64, origin_y: f64, pixel_width: f64, pixel_height: f64) -> Self {
        Self {
            origin_x,
            origin_y,
            pixel_width,
            pixel_height,
        }
    }

    /// Map coordinates of the center of cell `(col, row)`
    pub fn pixel_to_geo(&self, col: usize, row: usize) -> (f64, f64) {
        self.apply(col as f64 + 0.5, row as f64 + 0.5)
    }

    /// Map coordinates of the upper-left corner of cell `(col, row)`
    pub fn pixel_to_geo_corner(&self, col: usize, row: usize) -> (f64, f64) {
        self.apply(col as f64, row as f64)
    }

    /// Map coordinates of a fractional pixel position; integer positions are cell corners.
    pub fn apply(&self, col: f64, row: f64) -> (f64, f64) {
        (
            self.origin_x + col * self.pixel_width,
            self.origin_y + row * self.pixel_height,
        )
    }

    /// Fractional `(col, row)` of a map position.
    ///
    /// A degenerate transform (zero pixel size) yields `NaN`.
    pub fn geo_to_pixel(&self, x: f64, y: f64) -> (f64, f64) {
        if self.pixel_width == 0.0 || self.pixel_height == 0.0 {
            return (f64::NAN, f64::NAN);
        }
        (
            (x - self.origin_x) / self.pixel_width,
            (y - self.origin_y) / self.pixel_height,
        )
    }

    /// Transform of a sub-grid whose upper-left cell is `(col, row)` of this grid
    pub fn offset(&self, col: usize, row: usize) -> Self {
        let (origin_x, origin_y) = self.pixel_to_geo_corner(col, row);
        Self { origin_x, origin_y, ..*self }
    }

    /// Width of one cell in map units
    pub fn cell_size(&self) -> f64 {
        self.pixel_width.abs()
    }

    /// Ground area of one cell in map units squared
    pub fn cell_area(&self) -> f64 {
        (self.pixel_width * self.pixel_height).abs()
    }

    /// `(min_x, min_y, max_x, max_y)` of a `cols` x `rows` grid
    pub fn bounds(&self, cols: usize, rows: usize) -> (f64, f64, f64, f64) {
        let (x0, y0) = self.apply(0.0, 0.0);
        let (x1, y1) = self.apply(cols as f64, rows as f64);
        (x0.min(x1), y0.min(y1), x0.max(x1), y0.max(y1))
    }
}

impl Default for GeoTransform {
    fn default() -> Self {
        Self::new(0.0, 0.0, 1.0, -1.0)
    }
}
