//! Horn (1981) 3x3 gradient shared by slope, aspect and hillshade
//!
//! ```text
//! a b c
//! d e f
//! g h i
//! ```
//!
//! dz/dx = ((c + 2f + i) - (a + 2d + g)) / (8 * cell_width)
//! dz/dy = ((g + 2h + i) - (a + 2b + c)) / (8 * cell_height)
//!
//! `dz/dy` is measured in pixel space, so it is positive when elevation
//! increases southward in a north-up raster.

use geohaz_core::raster::Raster;

/// How cells lacking a complete 3x3 neighborhood are treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EdgeHandling {
    /// Missing neighbors are reflected through the center cell
    /// (`2e - opposite`). When the opposite neighbor is missing too, as for
    /// diagonals at a corner, the value is extrapolated along each axis from
    /// one-sided differences. A planar surface keeps its gradient all the
    /// way to the raster border.
    #[default]
    Extrapolate,
    /// Border cells and cells next to no-data become no-data
    Skip,
}

/// Partial derivatives at one cell
#[derive(Debug, Clone, Copy)]
pub(crate) struct Gradient {
    pub dz_dx: f64,
    pub dz_dy: f64,
}

impl Gradient {
    /// Steepest slope angle in radians
    pub fn slope_rad(&self) -> f64 {
        (self.dz_dx * self.dz_dx + self.dz_dy * self.dz_dy).sqrt().atan()
    }

    pub fn is_flat(&self) -> bool {
        self.dz_dx.abs() < 1e-10 && self.dz_dy.abs() < 1e-10
    }
}

/// Elevation change per cell step along one axis, from whichever side is present
fn axis_step(dem: &Raster<f64>, e: f64, row: isize, col: isize, dr: isize, dc: isize) -> f64 {
    match (valid(dem, row + dr, col + dc), valid(dem, row - dr, col - dc)) {
        (Some(ahead), _) => ahead - e,
        (None, Some(behind)) => e - behind,
        (None, None) => 0.0,
    }
}

fn valid(dem: &Raster<f64>, row: isize, col: isize) -> Option<f64> {
    let (rows, cols) = dem.shape();
    if row < 0 || col < 0 || row >= rows as isize || col >= cols as isize {
        return None;
    }
    // SAFETY: bounds checked above
    let v = unsafe { dem.get_unchecked(row as usize, col as usize) };
    if dem.is_nodata(v) {
        None
    } else {
        Some(v)
    }
}

/// Horn gradient at (row, col), scaled by `z_factor`.
///
/// Returns `None` when the center is no-data, or when a neighbor is
/// missing and `edges` is [`EdgeHandling::Skip`].
pub(crate) fn horn_gradient(
    dem: &Raster<f64>,
    row: usize,
    col: usize,
    z_factor: f64,
    edges: EdgeHandling,
) -> Option<Gradient> {
    let (r, c) = (row as isize, col as isize);
    let e = valid(dem, r, c)?;

    // w[dr + 1][dc + 1]
    let mut w = [[e; 3]; 3];
    for dr in -1..=1isize {
        for dc in -1..=1isize {
            if dr == 0 && dc == 0 {
                continue;
            }
            let v = match valid(dem, r + dr, c + dc) {
                Some(v) => v,
                None => match edges {
                    EdgeHandling::Skip => return None,
                    EdgeHandling::Extrapolate => match valid(dem, r - dr, c - dc) {
                        Some(opposite) => 2.0 * e - opposite,
                        None => {
                            e + dr as f64 * axis_step(dem, e, r, c, 1, 0)
                                + dc as f64 * axis_step(dem, e, r, c, 0, 1)
                        }
                    },
                },
            };
            w[(dr + 1) as usize][(dc + 1) as usize] = v;
        }
    }

    let [[a, b, cc], [d, _, f], [g, h, i]] = w;
    let transform = dem.transform();
    let cell_x = transform.pixel_width.abs();
    let cell_y = transform.pixel_height.abs();

    Some(Gradient {
        dz_dx: z_factor * ((cc + 2.0 * f + i) - (a + 2.0 * d + g)) / (8.0 * cell_x),
        dz_dy: z_factor * ((g + 2.0 * h + i) - (a + 2.0 * b + cc)) / (8.0 * cell_y),
    })
}
