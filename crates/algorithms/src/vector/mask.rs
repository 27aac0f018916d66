//! Clip rasters to polygon masks
//!
//! A cell is kept when its center lies inside the mask; all other cells
//! become no-data. Without `maintain_extent` the output is cropped to the
//! cells covering the mask's bounding box.

use crate::maybe_rayon::*;
use geo::{Contains, Geometry, MultiPolygon, Point};
use geohaz_core::raster::{Raster, RasterElement};
use geohaz_core::{Error, Result};

use super::spatial::BoundingBox;

/// Parameters for clipping by mask
#[derive(Debug, Clone, Default)]
pub struct ClipParams {
    /// Keep the input grid extent instead of cropping to the mask
    pub maintain_extent: bool,
}

/// Collect the polygonal parts of a set of geometries into one mask.
pub fn mask_from_geometries<'a>(geometries: impl IntoIterator<Item = &'a Geometry<f64>>) -> MultiPolygon<f64> {
    let mut polygons = Vec::new();
    for geom in geometries {
        match geom {
            Geometry::Polygon(p) => polygons.push(p.clone()),
            Geometry::MultiPolygon(mp) => polygons.extend(mp.0.iter().cloned()),
            Geometry::Rect(r) => polygons.push(r.to_polygon()),
            _ => {}
        }
    }
    MultiPolygon::new(polygons)
}

/// Clip `raster` to the area covered by `mask`.
///
/// Returns an error when the mask is empty or misses the raster extent.
pub fn clip_to_mask<T: RasterElement>(
    raster: &Raster<T>,
    mask: &MultiPolygon<f64>,
    params: &ClipParams,
) -> Result<Raster<T>> {
    let mask_bbox = BoundingBox::of_mask(mask)
        .ok_or_else(|| Error::UnsupportedGeometry("clip mask has no polygons".into()))?;
    let overlap = BoundingBox::of_raster(raster)
        .intersection(&mask_bbox)
        .ok_or_else(|| Error::Algorithm("clip mask does not overlap the raster".into()))?;

    let source = if params.maintain_extent {
        raster.clone()
    } else {
        let (r0, c0, r1, c1) = cell_window(raster, &overlap);
        raster.window(r0, c0, r1 - r0, c1 - c0)?
    };

    let nodata = source.nodata().unwrap_or_else(T::default_nodata);
    let (rows, cols) = source.shape();
    let transform = *source.transform();

    let data: Vec<T> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            (0..cols)
                .map(|col| {
                    let (x, y) = transform.pixel_to_geo(col, row);
                    // SAFETY: row < rows, col < cols
                    let v = unsafe { source.get_unchecked(row, col) };
                    if mask_bbox.contains_point(x, y) && mask.contains(&Point::new(x, y)) {
                        v
                    } else {
                        nodata
                    }
                })
                .collect::<Vec<_>>()
        })
        .collect();

    source.derive(data, Some(nodata))
}

/// Row/column window `[r0, r1) x [c0, c1)` of cells touching `bbox`.
fn cell_window<T: RasterElement>(raster: &Raster<T>, bbox: &BoundingBox) -> (usize, usize, usize, usize) {
    let (rows, cols) = raster.shape();
    let corners = [
        raster.geo_to_pixel(bbox.min_x, bbox.min_y),
        raster.geo_to_pixel(bbox.max_x, bbox.max_y),
    ];
    let clamp = |v: f64, n: usize| v.max(0.0).min(n as f64) as usize;

    let col_lo = corners.iter().map(|p| p.0).fold(f64::INFINITY, f64::min);
    let col_hi = corners.iter().map(|p| p.0).fold(f64::NEG_INFINITY, f64::max);
    let row_lo = corners.iter().map(|p| p.1).fold(f64::INFINITY, f64::min);
    let row_hi = corners.iter().map(|p| p.1).fold(f64::NEG_INFINITY, f64::max);

    let c0 = clamp(col_lo.floor(), cols);
    let r0 = clamp(row_lo.floor(), rows);
    let c1 = clamp(col_hi.ceil(), cols).max(c0 + 1).min(cols);
    let r1 = clamp(row_hi.ceil(), rows).max(r0 + 1).min(rows);
    (r0, c0, r1, c1)
}
