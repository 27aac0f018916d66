//! Area of hazard polygons

use geo::{Area, Geometry};

/// Unsigned area in CRS units squared; zero for non-polygonal geometries.
///
/// Holes are subtracted.
pub fn area(geom: &Geometry<f64>) -> f64 {
    match geom {
        Geometry::Polygon(_) | Geometry::MultiPolygon(_) | Geometry::Rect(_) | Geometry::Triangle(_) => {
            geom.unsigned_area()
        }
        _ => 0.0,
    }
}
