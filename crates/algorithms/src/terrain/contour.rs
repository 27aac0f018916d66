//! Contour lines
//!
//! Marching squares over the grid of cell centers. Segments of one level
//! are stitched into polylines through the grid edges they share, giving
//! one feature per connected line with its elevation in `Contour`.

use std::collections::BTreeMap;

use geo::{Coord, Geometry, LineString};
use geohaz_core::raster::Raster;
use geohaz_core::vector::{Feature, FeatureCollection};
use geohaz_core::{Error, Result};

/// Parameters for contour generation
#[derive(Debug, Clone)]
pub struct ContourParams {
    /// Elevation difference between successive contour lines
    pub interval: f64,
    /// Contours are generated at `base + n * interval`
    pub base: f64,
    /// Attribute receiving the contour elevation
    pub field: String,
}

impl Default for ContourParams {
    fn default() -> Self {
        Self {
            interval: 100.0,
            base: 0.0,
            field: "Contour".to_string(),
        }
    }
}

/// Grid edge between two adjacent cell centers
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum GridEdge {
    /// Between (row, col) and (row, col + 1)
    Horizontal(usize, usize),
    /// Between (row, col) and (row + 1, col)
    Vertical(usize, usize),
}

const TOP: usize = 0;
const RIGHT: usize = 1;
const BOTTOM: usize = 2;
const LEFT: usize = 3;

/// Edge pairs crossed by the level for each corner case
/// (bits: top-left 8, top-right 4, bottom-right 2, bottom-left 1).
/// Saddles (5, 10) are resolved separately.
fn case_segments(case: u8) -> &'static [(usize, usize)] {
    match case {
        1 | 14 => &[(LEFT, BOTTOM)],
        2 | 13 => &[(BOTTOM, RIGHT)],
        3 | 12 => &[(LEFT, RIGHT)],
        4 | 11 => &[(TOP, RIGHT)],
        6 | 9 => &[(TOP, BOTTOM)],
        7 | 8 => &[(LEFT, TOP)],
        _ => &[],
    }
}

fn saddle_segments(case: u8, center_above: bool) -> &'static [(usize, usize)] {
    match (case, center_above) {
        (5, true) | (10, false) => &[(LEFT, TOP), (BOTTOM, RIGHT)],
        (5, false) | (10, true) => &[(TOP, RIGHT), (LEFT, BOTTOM)],
        _ => &[],
    }
}

/// Generate contour polylines from a DEM.
///
/// Squares touching a no-data cell are skipped, so lines end at data gaps.
pub fn contour_lines(dem: &Raster<f64>, params: &ContourParams) -> Result<FeatureCollection> {
    if !(params.interval.is_finite() && params.interval > 0.0) {
        return Err(Error::InvalidParameter {
            name: "interval",
            value: params.interval.to_string(),
            reason: "contour interval must be > 0".into(),
        });
    }

    let (rows, cols) = dem.shape();
    let value_at = |row: usize, col: usize| -> Option<f64> {
        let v = dem.get(row, col).ok()?;
        (!dem.is_nodata(v)).then_some(v)
    };

    let mut collection = FeatureCollection::new();
    collection.fields.push(params.field.clone());
    collection.crs = dem.crs().cloned();

    let stats = dem.statistics();
    let (Some(min), Some(max)) = (stats.min, stats.max) else {
        return Ok(collection);
    };
    if rows < 2 || cols < 2 {
        return Ok(collection);
    }

    let first = ((min - params.base) / params.interval).ceil() as i64;
    let last = ((max - params.base) / params.interval).floor() as i64;
    let transform = *dem.transform();

    for n in first..=last {
        let level = params.base + n as f64 * params.interval;
        let mut points: BTreeMap<GridEdge, Coord<f64>> = BTreeMap::new();
        let mut segments: Vec<(GridEdge, GridEdge)> = Vec::new();

        let mut crossing = |a: (usize, usize), b: (usize, usize), edge: GridEdge| -> GridEdge {
            points.entry(edge).or_insert_with(|| {
                let va = value_at(a.0, a.1).unwrap_or(level);
                let vb = value_at(b.0, b.1).unwrap_or(level);
                let t = if (vb - va).abs() > f64::EPSILON { (level - va) / (vb - va) } else { 0.5 };
                let col = a.1 as f64 + t * (b.1 as f64 - a.1 as f64) + 0.5;
                let row = a.0 as f64 + t * (b.0 as f64 - a.0 as f64) + 0.5;
                let (x, y) = transform.apply(col, row);
                Coord { x, y }
            });
            edge
        };

        for row in 0..rows - 1 {
            for col in 0..cols - 1 {
                let (Some(tl), Some(tr), Some(br), Some(bl)) = (
                    value_at(row, col),
                    value_at(row, col + 1),
                    value_at(row + 1, col + 1),
                    value_at(row + 1, col),
                ) else {
                    continue;
                };

                let above = |v: f64| v >= level;
                let case = (above(tl) as u8) << 3 | (above(tr) as u8) << 2 | (above(br) as u8) << 1 | above(bl) as u8;
                let pairs = if case == 5 || case == 10 {
                    saddle_segments(case, above((tl + tr + br + bl) / 4.0))
                } else {
                    case_segments(case)
                };

                for &(e1, e2) in pairs {
                    let mut key = |side: usize| match side {
                        TOP => crossing((row, col), (row, col + 1), GridEdge::Horizontal(row, col)),
                        RIGHT => crossing((row, col + 1), (row + 1, col + 1), GridEdge::Vertical(row, col + 1)),
                        BOTTOM => crossing((row + 1, col), (row + 1, col + 1), GridEdge::Horizontal(row + 1, col)),
                        _ => crossing((row, col), (row + 1, col), GridEdge::Vertical(row, col)),
                    };
                    let a = key(e1);
                    let b = key(e2);
                    segments.push((a, b));
                }
            }
        }

        for line in stitch(&segments) {
            let coords: Vec<Coord<f64>> = line.iter().filter_map(|e| points.get(e).copied()).collect();
            if coords.len() < 2 || coords.iter().all(|c| *c == coords[0]) {
                continue;
            }
            let feature = Feature::new(Geometry::LineString(LineString::new(coords)))
                .with_property(params.field.clone(), level);
            collection.push(feature);
        }
    }

    Ok(collection)
}

/// Join segments sharing grid edges into polylines.
///
/// Open lines are traced from their ends first; what remains forms loops,
/// which are closed by repeating their first edge.
fn stitch(segments: &[(GridEdge, GridEdge)]) -> Vec<Vec<GridEdge>> {
    let mut adjacency: BTreeMap<GridEdge, Vec<usize>> = BTreeMap::new();
    for (i, &(a, b)) in segments.iter().enumerate() {
        adjacency.entry(a).or_default().push(i);
        adjacency.entry(b).or_default().push(i);
    }

    let mut used = vec![false; segments.len()];
    let mut lines = Vec::new();

    let ends: Vec<GridEdge> = adjacency
        .iter()
        .filter(|(_, segs)| segs.len() == 1)
        .map(|(&e, _)| e)
        .collect();
    let starts = ends.into_iter().chain(segments.iter().map(|&(a, _)| a)).collect::<Vec<_>>();

    for start in starts {
        let mut line = vec![start];
        let mut current = start;
        while let Some(&seg) = adjacency
            .get(&current)
            .and_then(|segs| segs.iter().find(|&&s| !used[s]))
        {
            used[seg] = true;
            let (a, b) = segments[seg];
            current = if a == current { b } else { a };
            line.push(current);
        }
        if line.len() > 1 {
            lines.push(line);
        }
    }
    lines
}
