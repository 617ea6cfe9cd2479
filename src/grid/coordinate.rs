// grid/coordinate.rs
// Grid geometry and coordinate placement patterns

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridCoordinate {
    pub row: usize,
    pub col: usize,
}

impl GridCoordinate {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

/// Fixed-size discretization of the beaker volume.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "GridSpec")]
pub struct Grid {
    pub rows: usize,
    pub cols: usize,
}

#[derive(Deserialize)]
struct GridSpec {
    rows: usize,
    cols: usize,
}

impl TryFrom<GridSpec> for Grid {
    type Error = String;

    fn try_from(spec: GridSpec) -> Result<Self, Self::Error> {
        if spec.rows == 0 || spec.cols == 0 {
            return Err(format!("grid must have at least one cell, got {}x{}", spec.rows, spec.cols));
        }
        Ok(Self { rows: spec.rows, cols: spec.cols })
    }
}

impl Grid {
    pub fn new(rows: usize, cols: usize) -> Self {
        assert!(rows > 0 && cols > 0, "grid must have at least one cell, got {rows}x{cols}");
        Self { rows, cols }
    }

    pub fn size(&self) -> usize {
        self.rows * self.cols
    }

    pub fn contains(&self, coord: GridCoordinate) -> bool {
        coord.row < self.rows && coord.col < self.cols
    }

    /// All cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = GridCoordinate> + '_ {
        (0..self.rows).flat_map(move |row| (0..self.cols).map(move |col| GridCoordinate { row, col }))
    }

    pub fn center(&self) -> GridCoordinate {
        GridCoordinate {
            row: (self.rows - 1) / 2,
            col: (self.cols - 1) / 2,
        }
    }

    /// Number of cells not taken by `occupied` (cells outside the grid are ignored).
    pub fn free_cells(&self, occupied: &HashSet<GridCoordinate>) -> usize {
        let taken = occupied.iter().filter(|c| self.contains(**c)).count();
        self.size() - taken
    }

    /// Every cell ordered by growth from the centre: ring by ring
    /// (Chebyshev distance), each ring walked by angle.
    pub fn spiral_order(&self) -> Vec<GridCoordinate> {
        let center = self.center();
        let cr = center.row as f64;
        let cc = center.col as f64;
        let mut cells: Vec<(usize, f64, GridCoordinate)> = self
            .cells()
            .map(|c| {
                let dr = c.row as f64 - cr;
                let dc = c.col as f64 - cc;
                let ring = dr.abs().max(dc.abs()) as usize;
                (ring, dr.atan2(dc), c)
            })
            .collect();
        cells.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.total_cmp(&b.1)));
        cells.into_iter().map(|(_, _, c)| c).collect()
    }
}

/// How a population of coordinates is laid out on the grid.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrowthPattern {
    /// Uniformly random free cells.
    #[default]
    Random,
    /// Grows outwards from the centre, used for precipitates.
    Spiral,
}

/// Picks up to `count` random free cells, skipping anything in `avoid`.
pub fn random_coords(
    grid: &Grid,
    count: usize,
    avoid: &HashSet<GridCoordinate>,
    rng: &mut StdRng,
) -> Vec<GridCoordinate> {
    let mut free: Vec<GridCoordinate> = grid.cells().filter(|c| !avoid.contains(c)).collect();
    free.shuffle(rng);
    free.truncate(count);
    free
}

/// Takes up to `count` cells in spiral order, skipping anything in `avoid`.
pub fn spiral_coords(grid: &Grid, count: usize, avoid: &HashSet<GridCoordinate>) -> Vec<GridCoordinate> {
    grid.spiral_order()
        .into_iter()
        .filter(|c| !avoid.contains(c))
        .take(count)
        .collect()
}
