//! Buffer zones around geometries
//!
//! Points become regular polygons approximating a circle. Polygons are
//! buffered as the convex hull of the circles around their vertices, which
//! is the exact outward buffer (up to arc discretization) for convex input
//! such as map quadrangles.

use geo::{ConvexHull, Coord, LineString, MultiPoint, Point, Polygon};
use geohaz_core::{Error, Result};
use std::f64::consts::PI;

/// Parameters for buffer operations
#[derive(Debug, Clone)]
pub struct BufferParams {
    /// Outward buffer distance in CRS units
    pub distance: f64,
    /// Number of segments approximating a full circle
    pub segments: usize,
}

impl Default for BufferParams {
    fn default() -> Self {
        Self {
            distance: 1.0,
            segments: 32,
        }
    }
}

impl BufferParams {
    pub fn new(distance: f64) -> Self {
        Self {
            distance,
            ..Default::default()
        }
    }

    fn validate(&self) -> Result<()> {
        if !self.distance.is_finite() || self.distance < 0.0 {
            return Err(Error::InvalidParameter {
                name: "distance",
                value: self.distance.to_string(),
                reason: "buffer distance must be finite and non-negative".into(),
            });
        }
        Ok(())
    }
}

fn circle_coords(center: Coord<f64>, r: f64, segments: usize) -> impl Iterator<Item = Coord<f64>> {
    let n = segments.max(4);
    (0..n).map(move |i| {
        let angle = 2.0 * PI * i as f64 / n as f64;
        Coord {
            x: center.x + r * angle.cos(),
            y: center.y + r * angle.sin(),
        }
    })
}

/// Create a circular buffer around a point.
pub fn buffer_point(point: &Point<f64>, params: &BufferParams) -> Polygon<f64> {
    let mut coords: Vec<Coord<f64>> = circle_coords(point.0, params.distance.abs(), params.segments).collect();
    coords.push(coords[0]);
    Polygon::new(LineString::from(coords), vec![])
}

/// Buffer a polygon outward by `params.distance`.
///
/// Holes are dropped. Concave input is over-approximated by its hull.
pub fn buffer_polygon(polygon: &Polygon<f64>, params: &BufferParams) -> Result<Polygon<f64>> {
    params.validate()?;
    if polygon.exterior().0.len() < 4 {
        return Err(Error::UnsupportedGeometry(
            "cannot buffer a polygon with a degenerate exterior ring".into(),
        ));
    }

    let points: Vec<Point<f64>> = polygon
        .exterior()
        .coords()
        .flat_map(|&c| {
            if params.distance == 0.0 {
                vec![c]
            } else {
                circle_coords(c, params.distance, params.segments).collect()
            }
        })
        .map(Point::from)
        .collect();

    Ok(MultiPoint::from(points).convex_hull())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use geo::{Area, Contains};

    fn square(size: f64) -> Polygon<f64> {
        Polygon::new(
            LineString::from(vec![(0.0, 0.0), (size, 0.0), (size, size), (0.0, size), (0.0, 0.0)]),
            vec![],
        )
    }

    #[test]
    fn test_buffer_point_circle() {
        let polygon = buffer_point(&Point::new(0.0, 0.0), &BufferParams { distance: 10.0, segments: 64 });
        let expected = PI * 100.0;
        let error = (polygon.unsigned_area() - expected).abs() / expected;
        assert!(error < 0.01, "circle area error {:.2}%", error * 100.0);
        assert_eq!(polygon.exterior().0.len(), 65);
    }

    #[test]
    fn test_buffer_square_area() {
        // Exact buffer of a square: s² + 4·s·d + π·d²
        let s = 100.0;
        let d = 10.0;
        let buffered = buffer_polygon(&square(s), &BufferParams { distance: d, segments: 256 }).unwrap();
        let expected = s * s + 4.0 * s * d + PI * d * d;
        assert_relative_eq!(buffered.unsigned_area(), expected, max_relative = 1e-3);
    }

    #[test]
    fn test_buffer_contains_input_and_margin() {
        let buffered = buffer_polygon(&square(100.0), &BufferParams::new(1609.344)).unwrap();
        assert!(buffered.contains(&square(100.0)));
        assert!(buffered.contains(&Point::new(-1500.0, 50.0)));
        assert!(!buffered.contains(&Point::new(-1700.0, 50.0)));
    }

    #[test]
    fn test_zero_distance_is_hull() {
        let buffered = buffer_polygon(&square(5.0), &BufferParams::new(0.0)).unwrap();
        assert_relative_eq!(buffered.unsigned_area(), 25.0, epsilon = 1e-9);
    }

    #[test]
    fn test_concave_input_fills_notch() {
        let ell = Polygon::new(
            LineString::from(vec![(0.0, 0.0), (2.0, 0.0), (2.0, 1.0), (1.0, 1.0), (1.0, 2.0), (0.0, 2.0), (0.0, 0.0)]),
            vec![],
        );
        let buffered = buffer_polygon(&ell, &BufferParams::new(0.0)).unwrap();
        // Hull area: 3 for the L plus 0.5 for the triangle over the notch
        assert_relative_eq!(buffered.unsigned_area(), 3.5, epsilon = 1e-9);
        assert!(buffered.contains(&Point::new(1.2, 1.2)));
        assert!(!buffered.contains(&Point::new(1.8, 1.8)));
    }

    #[test]
    fn test_negative_distance_rejected() {
        assert!(buffer_polygon(&square(5.0), &BufferParams::new(-1.0)).is_err());
    }
}
