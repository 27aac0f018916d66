//! Cell neighborhoods used by moving-window and region-growing operations

/// Connectivity pattern around a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Neighborhood {
    /// 3x3 neighborhood (8 neighbors + center)
    Queen3x3,
    /// 3x3 without corners (4 neighbors + center)
    Rook3x3,
}

impl Neighborhood {
    /// Offsets of the neighbors, excluding the center, as (row, col) deltas
    pub fn offsets(&self) -> &'static [(isize, isize)] {
        match self {
            Neighborhood::Queen3x3 => &[
                (-1, -1),
                (-1, 0),
                (-1, 1),
                (0, -1),
                (0, 1),
                (1, -1),
                (1, 0),
                (1, 1),
            ],
            Neighborhood::Rook3x3 => &[(-1, 0), (0, -1), (0, 1), (1, 0)],
        }
    }

    /// In-bounds neighbors of (row, col) in a grid of the given shape
    pub fn neighbors(
        &self,
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    ) -> impl Iterator<Item = (usize, usize)> {
        self.offsets().iter().filter_map(move |&(dr, dc)| {
            let r = row as isize + dr;
            let c = col as isize + dc;
            if r < 0 || c < 0 || r >= rows as isize || c >= cols as isize {
                None
            } else {
                Some((r as usize, c as usize))
            }
        })
    }
}
