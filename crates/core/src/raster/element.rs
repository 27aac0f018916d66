//! Cell value types

use num_traits::{NumCast, Zero};
use std::fmt::Debug;

/// A value storable in a raster cell.
///
/// Elevations and slopes are floats; truncated slopes and hazard classes are
/// `i32`. Floats treat `NaN` as no-data in addition to the raster's own
/// no-data value.
pub trait RasterElement:
    Copy + Debug + PartialOrd + NumCast + Zero + Send + Sync + 'static
{
    /// No-data value used when a raster declares none
    fn default_nodata() -> Self;

    fn is_nodata(&self, nodata: Option<Self>) -> bool;

    fn to_f64(self) -> Option<f64> {
        NumCast::from(self)
    }

    /// `None` when `value` does not fit the type
    fn from_f64(value: f64) -> Option<Self> {
        NumCast::from(value)
    }
}

impl RasterElement for i32 {
    fn default_nodata() -> Self {
        i32::MIN
    }

    fn is_nodata(&self, nodata: Option<Self>) -> bool {
        nodata == Some(*self)
    }
}

macro_rules! float_element {
    ($t:ty) => {
        impl RasterElement for $t {
            fn default_nodata() -> Self {
                <$t>::NAN
            }

            fn is_nodata(&self, nodata: Option<Self>) -> bool {
                self.is_nan() || nodata.is_some_and(|nd| (self - nd).abs() < <$t>::EPSILON * 100.0)
            }
        }
    };
}

float_element!(f32);
float_element!(f64);
