//! Conversion of floating point rasters to integers

use crate::maybe_rayon::*;
use crate::reclass::CLASS_NODATA;
use geohaz_core::raster::Raster;
use geohaz_core::Result;

/// Truncate each cell toward zero, e.g. a slope of 30.9° becomes 30.
///
/// No-data cells and values outside the `i32` range become [`CLASS_NODATA`].
pub fn truncate_to_int(raster: &Raster<f64>) -> Result<Raster<i32>> {
    let data: Vec<i32> = raster
        .data()
        .iter()
        .copied()
        .collect::<Vec<_>>()
        .into_par_iter()
        .map(|v| {
            if raster.is_nodata(v) || !v.is_finite() {
                return CLASS_NODATA;
            }
            let t = v.trunc();
            if t <= i32::MIN as f64 || t > i32::MAX as f64 {
                CLASS_NODATA
            } else {
                t as i32
            }
        })
        .collect();

    raster.derive(data, Some(CLASS_NODATA))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncates_toward_zero() {
        let raster = Raster::from_vec(vec![30.99, 30.0, 0.4, -2.7], 2, 2).unwrap();
        let ints = truncate_to_int(&raster).unwrap();
        assert_eq!(ints.data().iter().copied().collect::<Vec<_>>(), vec![30, 30, 0, -2]);
    }

    #[test]
    fn test_nodata_propagates() {
        let mut raster = Raster::from_vec(vec![f64::NAN, -9999.0, 12.0, 1e12], 2, 2).unwrap();
        raster.set_nodata(Some(-9999.0));
        let ints = truncate_to_int(&raster).unwrap();
        assert_eq!(ints.get(0, 0).unwrap(), CLASS_NODATA);
        assert_eq!(ints.get(0, 1).unwrap(), CLASS_NODATA);
        assert_eq!(ints.get(1, 0).unwrap(), 12);
        assert_eq!(ints.get(1, 1).unwrap(), CLASS_NODATA);
    }
}
