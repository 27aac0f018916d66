//! Raster to polygon conversion
//!
//! Groups 4-connected cells of equal class into regions and traces each
//! region's cell boundary into a polygon (holes included). Vertices are
//! emitted only where the boundary turns, so straight runs of cell edges
//! collapse to single segments.

use std::collections::{BTreeSet, VecDeque};

use geo::{Coord, Geometry, LineString, MultiPolygon, Polygon};
use geohaz_core::raster::{Neighborhood, Raster};
use geohaz_core::vector::{Feature, FeatureCollection};
use geohaz_core::{Error, Result};
use tracing::debug;

use super::measurements::area;
use super::simplify::simplify_dp;

/// Parameters for polygonization
#[derive(Debug, Clone)]
pub struct PolygonizeParams {
    /// Attribute receiving the cell class
    pub value_field: String,
    /// Attribute receiving the polygon area; `None` skips it
    pub area_field: Option<String>,
    /// Douglas-Peucker tolerance in CRS units; `0.0` keeps every turn
    pub simplify_tolerance: f64,
}

impl Default for PolygonizeParams {
    fn default() -> Self {
        Self {
            value_field: "gridcode".to_string(),
            area_field: Some("Shape_Area".to_string()),
            simplify_tolerance: 0.0,
        }
    }
}

/// Direction of a boundary edge in pixel space (row axis pointing down)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Dir {
    East,
    South,
    West,
    North,
}

impl Dir {
    fn step(self) -> (i64, i64) {
        match self {
            Dir::East => (1, 0),
            Dir::South => (0, 1),
            Dir::West => (-1, 0),
            Dir::North => (0, -1),
        }
    }

    fn right(self) -> Self {
        match self {
            Dir::East => Dir::South,
            Dir::South => Dir::West,
            Dir::West => Dir::North,
            Dir::North => Dir::East,
        }
    }

    fn left(self) -> Self {
        self.right().right().right()
    }
}

/// Unit cell edge starting at corner (x, y), with its region on the right.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct Edge {
    y: i64,
    x: i64,
    dir: Dir,
}

impl Edge {
    fn end(&self) -> (i64, i64) {
        let (dx, dy) = self.dir.step();
        (self.x + dx, self.y + dy)
    }
}

/// Boundary edges of one labelled region.
fn region_edges(cells: &[(usize, usize)], labels: &[usize], label: usize, rows: usize, cols: usize) -> BTreeSet<Edge> {
    let same = |r: isize, c: isize| {
        r >= 0
            && c >= 0
            && (r as usize) < rows
            && (c as usize) < cols
            && labels[r as usize * cols + c as usize] == label
    };

    let mut edges = BTreeSet::new();
    for &(row, col) in cells {
        let (r, c) = (row as isize, col as isize);
        let (x, y) = (col as i64, row as i64);
        if !same(r - 1, c) {
            edges.insert(Edge { x, y, dir: Dir::East });
        }
        if !same(r, c + 1) {
            edges.insert(Edge { x: x + 1, y, dir: Dir::South });
        }
        if !same(r + 1, c) {
            edges.insert(Edge { x: x + 1, y: y + 1, dir: Dir::West });
        }
        if !same(r, c - 1) {
            edges.insert(Edge { x, y: y + 1, dir: Dir::North });
        }
    }
    edges
}

/// Link boundary edges into closed rings of corner coordinates.
///
/// Where two diagonal cells of the region meet at a corner the trace turns
/// toward the region, which keeps 4-connected regions from joining through
/// a shared vertex.
fn trace_rings(edges: &BTreeSet<Edge>) -> Result<Vec<Vec<(i64, i64)>>> {
    let mut remaining = edges.clone();
    let mut rings = Vec::new();

    while let Some(start) = remaining.pop_first() {
        let mut ring = Vec::new();
        let mut edge = start;
        loop {
            let (nx, ny) = edge.end();
            let next = [edge.dir.right(), edge.dir, edge.dir.left()]
                .into_iter()
                .map(|dir| Edge { x: nx, y: ny, dir })
                .find(|e| edges.contains(e))
                .ok_or_else(|| Error::Algorithm(format!("open region boundary at corner ({nx}, {ny})")))?;

            if next.dir != edge.dir {
                ring.push((nx, ny));
            }
            if next == start {
                break;
            }
            if !remaining.remove(&next) {
                return Err(Error::Algorithm(format!("boundary edge reused at corner ({nx}, {ny})")));
            }
            edge = next;
        }
        if let Some(&first) = ring.first() {
            ring.push(first);
            rings.push(ring);
        }
    }
    Ok(rings)
}

/// Twice the signed area in pixel space; positive for exterior rings.
fn signed_area2(ring: &[(i64, i64)]) -> i64 {
    ring.windows(2)
        .map(|w| w[0].0 * w[1].1 - w[1].0 * w[0].1)
        .sum()
}

fn ring_bbox(ring: &[(i64, i64)]) -> (i64, i64, i64, i64) {
    ring.iter().fold((i64::MAX, i64::MAX, i64::MIN, i64::MIN), |(x0, y0, x1, y1), &(x, y)| {
        (x0.min(x), y0.min(y), x1.max(x), y1.max(y))
    })
}

/// Assemble traced rings into a polygon geometry in map coordinates.
fn assemble(rings: Vec<Vec<(i64, i64)>>, raster: &Raster<i32>) -> Option<Geometry<f64>> {
    let transform = raster.transform();
    let to_line = |ring: &[(i64, i64)]| -> LineString<f64> {
        ring.iter()
            .map(|&(x, y)| {
                let (gx, gy) = transform.apply(x as f64, y as f64);
                Coord { x: gx, y: gy }
            })
            .collect()
    };

    let (outers, holes): (Vec<_>, Vec<_>) = rings.into_iter().partition(|r| signed_area2(r) > 0);

    let mut polygons: Vec<(Vec<(i64, i64)>, Vec<LineString<f64>>)> =
        outers.into_iter().map(|r| (r, Vec::new())).collect();
    for hole in holes {
        let (hx0, hy0, hx1, hy1) = ring_bbox(&hole);
        let owner = polygons
            .iter_mut()
            .filter(|(outer, _)| {
                let (x0, y0, x1, y1) = ring_bbox(outer);
                x0 <= hx0 && y0 <= hy0 && x1 >= hx1 && y1 >= hy1
            })
            .min_by_key(|(outer, _)| signed_area2(outer));
        if let Some((_, interiors)) = owner {
            interiors.push(to_line(&hole));
        }
    }

    let mut polygons: Vec<Polygon<f64>> = polygons
        .into_iter()
        .map(|(outer, interiors)| Polygon::new(to_line(&outer), interiors))
        .collect();

    match polygons.len() {
        0 => None,
        1 => polygons.pop().map(Geometry::Polygon),
        _ => Some(Geometry::MultiPolygon(MultiPolygon::new(polygons))),
    }
}

/// Convert a class raster into polygons, one feature per 4-connected region.
///
/// No-data cells produce no polygons. Each feature carries the region's
/// class in `params.value_field` and, when configured, its area in
/// `params.area_field`. Features are ordered by the row-major position of
/// each region's first cell.
pub fn polygonize(raster: &Raster<i32>, params: &PolygonizeParams) -> Result<FeatureCollection> {
    if params.simplify_tolerance < 0.0 || !params.simplify_tolerance.is_finite() {
        return Err(Error::InvalidParameter {
            name: "simplify_tolerance",
            value: params.simplify_tolerance.to_string(),
            reason: "must be finite and non-negative".into(),
        });
    }

    let (rows, cols) = raster.shape();
    let data = raster.data();
    let mut labels = vec![usize::MAX; rows * cols];
    let mut regions: Vec<(i32, Vec<(usize, usize)>)> = Vec::new();

    for row in 0..rows {
        for col in 0..cols {
            let value = data[[row, col]];
            if labels[row * cols + col] != usize::MAX || raster.is_nodata(value) {
                continue;
            }
            let label = regions.len();
            let mut cells = Vec::new();
            let mut queue = VecDeque::from([(row, col)]);
            labels[row * cols + col] = label;
            while let Some((r, c)) = queue.pop_front() {
                cells.push((r, c));
                for (nr, nc) in Neighborhood::Rook3x3.neighbors(r, c, rows, cols) {
                    let idx = nr * cols + nc;
                    if labels[idx] == usize::MAX && data[[nr, nc]] == value {
                        labels[idx] = label;
                        queue.push_back((nr, nc));
                    }
                }
            }
            regions.push((value, cells));
        }
    }

    debug!(regions = regions.len(), rows, cols, "labelled raster regions");

    let mut collection = FeatureCollection::new();
    collection.fields.push(params.value_field.clone());
    if let Some(area_field) = &params.area_field {
        collection.fields.push(area_field.clone());
    }
    collection.crs = raster.crs().cloned();

    for (label, (value, cells)) in regions.iter().enumerate() {
        let edges = region_edges(cells, &labels, label, rows, cols);
        let rings = trace_rings(&edges)?;
        let Some(geometry) = assemble(rings, raster) else {
            continue;
        };
        let geometry = simplify_dp(&geometry, params.simplify_tolerance);

        let mut feature = Feature::new(geometry);
        feature.set_property(params.value_field.clone(), i64::from(*value));
        if let Some(area_field) = &params.area_field {
            let shape_area = feature.geometry.as_ref().map(area).unwrap_or(0.0);
            feature.set_property(area_field.clone(), shape_area);
        }
        collection.push(feature);
    }

    Ok(collection)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use geohaz_core::vector::AttributeValue;
    use geohaz_core::GeoTransform;

    fn class_raster(values: Vec<i32>, rows: usize, cols: usize) -> Raster<i32> {
        let mut r = Raster::from_vec(values, rows, cols).unwrap();
        r.set_transform(GeoTransform::new(1000.0, 2000.0, 10.0, -10.0));
        r.set_nodata(Some(i32::MIN));
        r
    }

    fn polygon_of(feature: &Feature) -> &Polygon<f64> {
        match feature.geometry.as_ref().unwrap() {
            Geometry::Polygon(p) => p,
            other => panic!("expected polygon, got {other:?}"),
        }
    }

    #[test]
    fn test_uniform_raster_single_rectangle() {
        let raster = class_raster(vec![2; 12], 3, 4);
        let fc = polygonize(&raster, &PolygonizeParams::default()).unwrap();

        assert_eq!(fc.len(), 1);
        let f = &fc.features[0];
        assert_eq!(f.get_property("gridcode"), Some(&AttributeValue::Int(2)));
        assert_relative_eq!(f.get_property("Shape_Area").unwrap().as_f64().unwrap(), 1200.0);

        // Collinear cell edges collapse: 4 corners + closing vertex
        let poly = polygon_of(f);
        assert_eq!(poly.exterior().0.len(), 5);
        assert!(poly.interiors().is_empty());
        assert_eq!(fc.fields, vec!["gridcode".to_string(), "Shape_Area".to_string()]);
    }

    #[test]
    fn test_regions_split_by_class() {
        #[rustfmt::skip]
        let raster = class_raster(vec![
            1, 1, 2,
            1, 2, 2,
            1, 1, 1,
        ], 3, 3);
        let fc = polygonize(&raster, &PolygonizeParams::default()).unwrap();
        assert_eq!(fc.len(), 2);
        let areas: Vec<f64> = fc.iter().map(|f| f.get_property("Shape_Area").unwrap().as_f64().unwrap()).collect();
        assert_relative_eq!(areas[0], 600.0);
        assert_relative_eq!(areas[1], 300.0);
    }

    #[test]
    fn test_diagonal_cells_are_separate_regions() {
        #[rustfmt::skip]
        let raster = class_raster(vec![
            2, 1,
            1, 2,
        ], 2, 2);
        let fc = polygonize(&raster, &PolygonizeParams::default()).unwrap();
        // Two single cells of class 2 and two of class 1
        assert_eq!(fc.len(), 4);
        for f in fc.iter() {
            assert_relative_eq!(f.get_property("Shape_Area").unwrap().as_f64().unwrap(), 100.0);
        }
    }

    #[test]
    fn test_region_with_hole() {
        #[rustfmt::skip]
        let raster = class_raster(vec![
            2, 2, 2,
            2, 1, 2,
            2, 2, 2,
        ], 3, 3);
        let fc = polygonize(&raster, &PolygonizeParams::default()).unwrap();
        assert_eq!(fc.len(), 2);
        let ring = &fc.features[0];
        assert_eq!(polygon_of(ring).interiors().len(), 1);
        assert_relative_eq!(ring.get_property("Shape_Area").unwrap().as_f64().unwrap(), 800.0);
    }

    #[test]
    fn test_nodata_cells_skipped() {
        let raster = class_raster(vec![i32::MIN, 2, i32::MIN, 2], 2, 2);
        let fc = polygonize(&raster, &PolygonizeParams::default()).unwrap();
        assert_eq!(fc.len(), 1);
        assert_relative_eq!(fc.features[0].get_property("Shape_Area").unwrap().as_f64().unwrap(), 200.0);
    }

    #[test]
    fn test_geographic_placement() {
        let raster = class_raster(vec![1], 1, 1);
        let fc = polygonize(&raster, &PolygonizeParams::default()).unwrap();
        let poly = polygon_of(&fc.features[0]);
        let xs: Vec<f64> = poly.exterior().coords().map(|c| c.x).collect();
        let ys: Vec<f64> = poly.exterior().coords().map(|c| c.y).collect();
        assert!(xs.iter().all(|&x| x == 1000.0 || x == 1010.0));
        assert!(ys.iter().all(|&y| y == 2000.0 || y == 1990.0));
    }

    #[test]
    fn test_negative_tolerance_rejected() {
        let raster = class_raster(vec![1], 1, 1);
        let params = PolygonizeParams { simplify_tolerance: -1.0, ..Default::default() };
        assert!(polygonize(&raster, &params).is_err());
    }
}
