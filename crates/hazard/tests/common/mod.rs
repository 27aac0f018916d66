#![allow(dead_code)]

use geo::{Geometry, LineString, Polygon};
use geohaz_core::vector::{Feature, FeatureCollection};
use geohaz_core::{GeoTransform, Raster};

/// DEM rising toward the east with a constant slope of `degrees`.
pub fn planar_dem(rows: usize, cols: usize, cell: f64, degrees: f64) -> Raster<f64> {
    let mut dem = Raster::new(rows, cols);
    dem.set_transform(GeoTransform::new(0.0, rows as f64 * cell, cell, -cell));
    let rise = degrees.to_radians().tan() * cell;
    for row in 0..rows {
        for col in 0..cols {
            dem.set(row, col, 2000.0 + col as f64 * rise).unwrap();
        }
    }
    dem
}

pub fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Polygon<f64> {
    Polygon::new(
        LineString::from(vec![(x0, y0), (x1, y0), (x1, y1), (x0, y1), (x0, y0)]),
        vec![],
    )
}

pub fn feature(polygon: Polygon<f64>, field: &str, value: &str) -> Feature {
    Feature::new(Geometry::Polygon(polygon)).with_property(field, value)
}

/// Geology map of a 200 m square: Maroon west, Minturn east, landslide deposit north-east corner
pub fn geology() -> FeatureCollection {
    let mut fc = FeatureCollection::new();
    fc.push(feature(rect(0.0, 0.0, 100.0, 200.0), "FMT", "PPm"));
    fc.push(feature(rect(100.0, 0.0, 200.0, 150.0), "FMT", "Pm"));
    fc.push(feature(rect(100.0, 150.0, 200.0, 200.0), "FMT", "Qls"));
    fc
}

pub fn area_of(feature: &Feature) -> f64 {
    feature
        .get_property("Shape_Area")
        .and_then(|v| v.as_f64())
        .unwrap_or(f64::NAN)
}
