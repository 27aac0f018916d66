//! Range reclassification into integer classes
//!
//! Each entry maps an interval of input values to an output class. Interval
//! closure is explicit per entry so adjacent ranges can share a boundary
//! without ambiguity, e.g. `[0, 30] → 1` and `(30, 90] → 2`.

use crate::maybe_rayon::*;
use geohaz_core::raster::{Raster, RasterElement};
use geohaz_core::{Error, Result};

/// No-data value of class rasters
pub const CLASS_NODATA: i32 = i32::MIN;

/// Which interval endpoints belong to a class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Bounds {
    /// `min <= v <= max`
    #[default]
    Closed,
    /// `min < v <= max`
    LeftOpen,
    /// `min <= v < max`
    RightOpen,
}

/// A reclassification entry mapping an input range to an output class
#[derive(Debug, Clone, PartialEq)]
pub struct ReclassEntry {
    pub min: f64,
    pub max: f64,
    pub bounds: Bounds,
    /// Output class for this range
    pub value: i32,
}

impl ReclassEntry {
    /// Entry covering `[min, max]`
    pub fn new(min: f64, max: f64, value: i32) -> Self {
        Self { min, max, bounds: Bounds::Closed, value }
    }

    /// Entry covering `(min, max]`
    pub fn left_open(min: f64, max: f64, value: i32) -> Self {
        Self { min, max, bounds: Bounds::LeftOpen, value }
    }

    pub fn contains(&self, v: f64) -> bool {
        match self.bounds {
            Bounds::Closed => v >= self.min && v <= self.max,
            Bounds::LeftOpen => v > self.min && v <= self.max,
            Bounds::RightOpen => v >= self.min && v < self.max,
        }
    }
}

/// Parameters for reclassification
#[derive(Debug, Clone, Default)]
pub struct ReclassifyParams {
    /// Reclassification table; the first matching entry wins
    pub classes: Vec<ReclassEntry>,
    /// Class for valid cells matching no entry; `None` writes no-data
    pub default_value: Option<i32>,
}

impl ReclassifyParams {
    /// Two ordinal slope classes split at `threshold` degrees:
    /// `[0, threshold] → low`, `(threshold, 90] → high`.
    pub fn slope_split(threshold: f64, low: i32, high: i32) -> Result<Self> {
        if !(0.0..90.0).contains(&threshold) {
            return Err(Error::InvalidParameter {
                name: "threshold",
                value: threshold.to_string(),
                reason: "slope threshold must be in [0, 90) degrees".into(),
            });
        }
        Ok(Self {
            classes: vec![
                ReclassEntry::new(0.0, threshold, low),
                ReclassEntry::left_open(threshold, 90.0, high),
            ],
            default_value: None,
        })
    }

    /// Class of a single value
    pub fn classify(&self, v: f64) -> Option<i32> {
        self.classes
            .iter()
            .find(|entry| entry.contains(v))
            .map(|entry| entry.value)
            .or(self.default_value)
    }
}

/// Reclassify raster values into integer classes.
///
/// No-data input cells stay no-data ([`CLASS_NODATA`]).
pub fn reclassify<T: RasterElement>(raster: &Raster<T>, params: &ReclassifyParams) -> Result<Raster<i32>> {
    let (rows, cols) = raster.shape();

    let data: Vec<i32> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            (0..cols)
                .map(|col| {
                    // SAFETY: row < rows, col < cols
                    let v = unsafe { raster.get_unchecked(row, col) };
                    if raster.is_nodata(v) {
                        return CLASS_NODATA;
                    }
                    RasterElement::to_f64(v)
                        .and_then(|v| params.classify(v))
                        .unwrap_or(CLASS_NODATA)
                })
                .collect::<Vec<_>>()
        })
        .collect();

    raster.derive(data, Some(CLASS_NODATA))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_boundary_is_low_class() {
        let params = ReclassifyParams::slope_split(30.0, 1, 2).unwrap();
        assert_eq!(params.classify(0.0), Some(1));
        assert_eq!(params.classify(30.0), Some(1));
        assert_eq!(params.classify(30.01), Some(2));
        assert_eq!(params.classify(90.0), Some(2));
        assert_eq!(params.classify(90.5), None);
    }

    #[test]
    fn test_reclassify_raster() {
        let raster = Raster::from_vec(vec![12.0, 30.0, 30.01, f64::NAN, 45.0, 89.9], 2, 3).unwrap();
        let params = ReclassifyParams::slope_split(30.0, 1, 2).unwrap();
        let result = reclassify(&raster, &params).unwrap();

        assert_eq!(result.get(0, 0).unwrap(), 1);
        assert_eq!(result.get(0, 1).unwrap(), 1);
        assert_eq!(result.get(0, 2).unwrap(), 2);
        assert_eq!(result.get(1, 0).unwrap(), CLASS_NODATA);
        assert_eq!(result.get(1, 1).unwrap(), 2);
        assert_eq!(result.nodata(), Some(CLASS_NODATA));
    }

    #[test]
    fn test_integer_input_and_default() {
        let raster: Raster<i32> = Raster::from_vec(vec![27, 28, -5], 1, 3).unwrap();
        let mut params = ReclassifyParams::slope_split(27.5, 1, 2).unwrap();
        params.default_value = Some(0);
        let result = reclassify(&raster, &params).unwrap();
        assert_eq!(result.data().iter().copied().collect::<Vec<_>>(), vec![1, 2, 0]);
    }

    #[test]
    fn test_right_open_entry() {
        let entry = ReclassEntry { min: 0.0, max: 10.0, bounds: Bounds::RightOpen, value: 3 };
        assert!(entry.contains(0.0));
        assert!(!entry.contains(10.0));
        assert!(ReclassifyParams::slope_split(95.0, 1, 2).is_err());
    }
}
