//! Georeferenced raster grid

use crate::crs::CRS;
use crate::error::{Error, Result};
use crate::raster::{GeoTransform, RasterElement};
use ndarray::{s, Array2};

/// A georeferenced grid of cells, stored row-major.
///
/// ```ignore
/// use geohaz_core::Raster;
///
/// let mut dem: Raster<f64> = Raster::new(100, 100);
/// dem.set(10, 20, 2450.0)?;
/// let z = dem.get(10, 20)?;
/// ```
#[derive(Debug, Clone)]
pub struct Raster<T: RasterElement> {
    data: Array2<T>,
    transform: GeoTransform,
    crs: Option<CRS>,
    nodata: Option<T>,
}

impl<T: RasterElement> Raster<T> {
    /// Zero-filled raster
    pub fn new(rows: usize, cols: usize) -> Self {
        Self::wrap(Array2::zeros((rows, cols)))
    }

    pub fn filled(rows: usize, cols: usize, value: T) -> Self {
        Self::wrap(Array2::from_elem((rows, cols), value))
    }

    /// Raster from row-major values; `data.len()` must equal `rows * cols`.
    pub fn from_vec(data: Vec<T>, rows: usize, cols: usize) -> Result<Self> {
        if data.len() != rows * cols {
            return Err(Error::InvalidDimensions {
                width: cols,
                height: rows,
            });
        }
        let array = Array2::from_shape_vec((rows, cols), data).map_err(|e| Error::Other(e.to_string()))?;
        Ok(Self::wrap(array))
    }

    fn wrap(data: Array2<T>) -> Self {
        Self {
            data,
            transform: GeoTransform::default(),
            crs: None,
            nodata: None,
        }
    }

    /// Raster of another cell type over the same grid, from row-major values.
    ///
    /// Every algorithm output goes through here so georeferencing is never lost.
    pub fn derive<U: RasterElement>(&self, values: Vec<U>, nodata: Option<U>) -> Result<Raster<U>> {
        let (rows, cols) = self.shape();
        let mut out = Raster::from_vec(values, rows, cols)?;
        out.transform = self.transform;
        out.crs = self.crs.clone();
        out.nodata = nodata;
        Ok(out)
    }

    pub fn rows(&self) -> usize {
        self.data.nrows()
    }

    pub fn cols(&self) -> usize {
        self.data.ncols()
    }

    /// `(rows, cols)`
    pub fn shape(&self) -> (usize, usize) {
        self.data.dim()
    }

    /// Number of cells
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    fn out_of_bounds(&self, row: usize, col: usize) -> Error {
        Error::IndexOutOfBounds {
            row,
            col,
            rows: self.rows(),
            cols: self.cols(),
        }
    }

    pub fn get(&self, row: usize, col: usize) -> Result<T> {
        self.data
            .get((row, col))
            .copied()
            .ok_or_else(|| self.out_of_bounds(row, col))
    }

    /// Value at `(row, col)` without bounds checking
    ///
    /// # Safety
    /// Caller must ensure `row < self.rows()` and `col < self.cols()`
    pub unsafe fn get_unchecked(&self, row: usize, col: usize) -> T {
        unsafe { *self.data.uget((row, col)) }
    }

    pub fn set(&mut self, row: usize, col: usize, value: T) -> Result<()> {
        match self.data.get_mut((row, col)) {
            Some(cell) => {
                *cell = value;
                Ok(())
            }
            None => Err(self.out_of_bounds(row, col)),
        }
    }

    pub fn data(&self) -> &Array2<T> {
        &self.data
    }

    /// Copy of the `rows` x `cols` block starting at `(row, col)`.
    ///
    /// The copy is georeferenced where the block lies in this raster.
    pub fn window(&self, row: usize, col: usize, rows: usize, cols: usize) -> Result<Self> {
        if rows == 0 || cols == 0 || row + rows > self.rows() || col + cols > self.cols() {
            return Err(self.out_of_bounds(row + rows.saturating_sub(1), col + cols.saturating_sub(1)));
        }

        Ok(Self {
            data: self.data.slice(s![row..row + rows, col..col + cols]).to_owned(),
            transform: self.transform.offset(col, row),
            crs: self.crs.clone(),
            nodata: self.nodata,
        })
    }

    pub fn transform(&self) -> &GeoTransform {
        &self.transform
    }

    pub fn set_transform(&mut self, transform: GeoTransform) {
        self.transform = transform;
    }

    pub fn crs(&self) -> Option<&CRS> {
        self.crs.as_ref()
    }

    pub fn set_crs(&mut self, crs: Option<CRS>) {
        self.crs = crs;
    }

    pub fn nodata(&self) -> Option<T> {
        self.nodata
    }

    pub fn set_nodata(&mut self, nodata: Option<T>) {
        self.nodata = nodata;
    }

    /// Cell width in map units
    pub fn cell_size(&self) -> f64 {
        self.transform.cell_size()
    }

    pub fn cell_area(&self) -> f64 {
        self.transform.cell_area()
    }

    /// `(min_x, min_y, max_x, max_y)` in map units
    pub fn bounds(&self) -> (f64, f64, f64, f64) {
        self.transform.bounds(self.cols(), self.rows())
    }

    /// Map coordinates of the center of cell `(col, row)`
    pub fn pixel_to_geo(&self, col: usize, row: usize) -> (f64, f64) {
        self.transform.pixel_to_geo(col, row)
    }

    /// Fractional `(col, row)` of a map position
    pub fn geo_to_pixel(&self, x: f64, y: f64) -> (f64, f64) {
        self.transform.geo_to_pixel(x, y)
    }

    pub fn is_nodata(&self, value: T) -> bool {
        value.is_nodata(self.nodata)
    }

    /// Cells holding data
    pub fn valid_count(&self) -> usize {
        self.data.iter().filter(|&&v| !self.is_nodata(v)).count()
    }

    /// Range, mean and counts over the cells holding data
    pub fn statistics(&self) -> RasterStatistics<T> {
        let mut stats = RasterStatistics {
            min: None,
            max: None,
            mean: None,
            valid_count: 0,
            nodata_count: 0,
        };
        let mut sum = 0.0;

        for &value in self.data.iter().filter(|&&v| !self.is_nodata(v)) {
            if stats.min.map_or(true, |m| value < m) {
                stats.min = Some(value);
            }
            if stats.max.map_or(true, |m| value > m) {
                stats.max = Some(value);
            }
            if let Some(v) = RasterElement::to_f64(value) {
                sum += v;
                stats.valid_count += 1;
            }
        }

        stats.nodata_count = self.len() - stats.valid_count;
        if stats.valid_count > 0 {
            stats.mean = Some(sum / stats.valid_count as f64);
        }
        stats
    }
}

/// Basic statistics for a raster
#[derive(Debug, Clone)]
pub struct RasterStatistics<T> {
    pub min: Option<T>,
    pub max: Option<T>,
    pub mean: Option<f64>,
    pub valid_count: usize,
    pub nodata_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dem_cell_access() {
        let mut dem: Raster<f64> = Raster::new(10, 20);
        assert_eq!(dem.shape(), (10, 20));
        dem.set(5, 5, 2450.0).unwrap();
        assert_eq!(dem.get(5, 5).unwrap(), 2450.0);
        assert!(dem.set(10, 0, 1.0).is_err());
        assert!(dem.get(0, 20).is_err());
        assert!(Raster::from_vec(vec![1.0f64; 5], 2, 3).is_err());
    }

    #[test]
    fn test_raster_statistics_skip_nodata() {
        let mut raster: Raster<i32> = Raster::filled(4, 4, 7);
        raster.set_nodata(Some(-9999));
        raster.set(0, 0, -9999).unwrap();
        raster.set(1, 1, 2).unwrap();

        let stats = raster.statistics();
        assert_eq!(stats.min, Some(2));
        assert_eq!(stats.max, Some(7));
        assert_eq!(stats.valid_count, 15);
        assert_eq!(stats.nodata_count, 1);
        assert_eq!(raster.valid_count(), 15);
    }

    #[test]
    fn test_window_keeps_position() {
        let mut raster: Raster<f64> = Raster::new(10, 10);
        raster.set_transform(GeoTransform::new(500.0, 1000.0, 2.0, -2.0));
        raster.set(4, 3, 9.0).unwrap();

        let win = raster.window(4, 3, 2, 5).unwrap();
        assert_eq!(win.shape(), (2, 5));
        assert_eq!(win.get(0, 0).unwrap(), 9.0);
        assert_eq!(win.pixel_to_geo(0, 0), raster.pixel_to_geo(3, 4));
        assert!(raster.window(9, 9, 2, 2).is_err());
    }

    #[test]
    fn test_derive_keeps_meta() {
        let mut dem: Raster<f64> = Raster::new(2, 2);
        dem.set_transform(GeoTransform::new(10.0, 20.0, 5.0, -5.0));
        let classes = dem.derive(vec![1i32, 2, 2, 1], Some(i32::MIN)).unwrap();
        assert_eq!(classes.transform(), dem.transform());
        assert_eq!(classes.nodata(), Some(i32::MIN));
        assert!(dem.derive(vec![1i32], None).is_err());
    }
}
