//! Douglas-Peucker simplification of polygonal geometries

use geo::{Geometry, LineString, MultiPolygon, Polygon, Simplify};

/// Simplify a polygonal geometry with tolerance `tolerance`.
///
/// Rings that collapse below four coordinates are dropped (holes) or left
/// unsimplified (exteriors). Other geometries are returned unchanged.
pub fn simplify_dp(geom: &Geometry<f64>, tolerance: f64) -> Geometry<f64> {
    if tolerance <= 0.0 {
        return geom.clone();
    }
    match geom {
        Geometry::Polygon(p) => Geometry::Polygon(simplify_polygon(p, tolerance)),
        Geometry::MultiPolygon(mp) => Geometry::MultiPolygon(MultiPolygon::new(
            mp.0.iter().map(|p| simplify_polygon(p, tolerance)).collect(),
        )),
        Geometry::LineString(ls) => Geometry::LineString(ls.simplify(&tolerance)),
        other => other.clone(),
    }
}

fn simplify_polygon(polygon: &Polygon<f64>, tolerance: f64) -> Polygon<f64> {
    let exterior = polygon.exterior().simplify(&tolerance);
    let exterior = if exterior.0.len() >= 4 {
        exterior
    } else {
        polygon.exterior().clone()
    };
    let interiors: Vec<LineString<f64>> = polygon
        .interiors()
        .iter()
        .map(|ring| ring.simplify(&tolerance))
        .filter(|ring| ring.0.len() >= 4)
        .collect();
    Polygon::new(exterior, interiors)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wobbly_polygon() -> Polygon<f64> {
        Polygon::new(
            LineString::from(vec![
                (0.0, 0.0), (1.0, 0.1), (2.0, 0.0), (3.0, 0.05), (5.0, 0.0),
                (5.0, 5.0), (4.0, 4.9), (2.0, 5.1), (0.0, 5.0), (0.0, 0.0),
            ]),
            vec![],
        )
    }

    #[test]
    fn test_simplify_polygon_reduces_vertices() {
        let poly = wobbly_polygon();
        let before = poly.exterior().0.len();
        let Geometry::Polygon(p) = simplify_dp(&Geometry::Polygon(poly), 0.15) else {
            panic!("expected polygon");
        };
        assert!(p.exterior().0.len() < before);
        assert_eq!(p.exterior().0.first(), p.exterior().0.last());
    }

    #[test]
    fn test_zero_tolerance_is_identity() {
        let geom = Geometry::Polygon(wobbly_polygon());
        assert_eq!(simplify_dp(&geom, 0.0), geom);
    }

    #[test]
    fn test_tiny_hole_dropped() {
        let poly = Polygon::new(
            wobbly_polygon().exterior().clone(),
            vec![LineString::from(vec![(2.0, 2.0), (2.1, 2.0), (2.1, 2.1), (2.0, 2.1), (2.0, 2.0)])],
        );
        let Geometry::Polygon(p) = simplify_dp(&Geometry::Polygon(poly), 1.0) else {
            panic!("expected polygon");
        };
        assert!(p.interiors().is_empty());
    }
}
