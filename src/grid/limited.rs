// grid/limited.rs
// Allocator that places one molecule kind on the grid within [min, max] bounds

use log::debug;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashSet;

use super::coordinate::{random_coords, spiral_coords, Grid, GridCoordinate, GrowthPattern};
use super::fractioned::FractionedCoordinates;
use crate::equation::Equation;

/// Progress of a reactant-addition phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AdditionState {
    NotStarted,
    Adding,
    /// No more coordinates can be added, either because `max_to_add`
    /// was reached or because the grid has no free cells left.
    Full,
}

/// Grows a set of coordinates for a single molecule kind.
///
/// Coordinates never overlap `other_coords` (cells held by other kinds)
/// nor each other, and the total never exceeds `max_to_add`. Requests
/// beyond either limit are clamped silently.
#[derive(Clone, Debug)]
pub struct LimitedGridCoords {
    grid: Grid,
    coords: Vec<GridCoordinate>,
    other_coords: HashSet<GridCoordinate>,
    min_to_add: usize,
    max_to_add: usize,
    pattern: GrowthPattern,
    rng: StdRng,
}

impl LimitedGridCoords {
    /// Panics when `min_to_add > max_to_add` or when the grid cannot hold
    /// `min_to_add` coordinates next to `other_coords`; both are
    /// configuration mistakes rather than runtime conditions.
    pub fn new(
        grid: Grid,
        other_coords: impl IntoIterator<Item = GridCoordinate>,
        min_to_add: usize,
        max_to_add: usize,
        pattern: GrowthPattern,
        seed: u64,
    ) -> Self {
        assert!(
            min_to_add <= max_to_add,
            "min_to_add ({min_to_add}) must not exceed max_to_add ({max_to_add})"
        );
        let other_coords: HashSet<GridCoordinate> = other_coords.into_iter().collect();
        let free = grid.free_cells(&other_coords);
        assert!(
            min_to_add <= free,
            "grid {}x{} has {free} free cells but {min_to_add} are required",
            grid.rows,
            grid.cols
        );
        Self {
            grid,
            coords: Vec::new(),
            other_coords,
            min_to_add,
            max_to_add,
            pattern,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn grid(&self) -> Grid {
        self.grid
    }

    pub fn coords(&self) -> &[GridCoordinate] {
        &self.coords
    }

    pub fn other_coords(&self) -> &HashSet<GridCoordinate> {
        &self.other_coords
    }

    pub fn count(&self) -> usize {
        self.coords.len()
    }

    pub fn min_to_add(&self) -> usize {
        self.min_to_add
    }

    pub fn max_to_add(&self) -> usize {
        self.max_to_add
    }

    fn free_cells(&self) -> usize {
        self.grid.free_cells(&self.other_coords).saturating_sub(self.coords.len())
    }

    /// Number of further coordinates that could still be added.
    pub fn remaining_capacity(&self) -> usize {
        self.max_to_add.saturating_sub(self.coords.len()).min(self.free_cells())
    }

    pub fn can_add(&self) -> bool {
        self.remaining_capacity() > 0
    }

    pub fn has_added_enough(&self) -> bool {
        self.coords.len() >= self.min_to_add
    }

    pub fn state(&self) -> AdditionState {
        if !self.can_add() {
            AdditionState::Full
        } else if self.coords.is_empty() {
            AdditionState::NotStarted
        } else {
            AdditionState::Adding
        }
    }

    /// Appends up to `count` new coordinates and returns how many were added.
    pub fn add(&mut self, count: usize) -> usize {
        let to_add = count.min(self.remaining_capacity());
        if to_add < count {
            debug!(
                "clamped grid addition from {} to {} (have {}, max {})",
                count,
                to_add,
                self.coords.len(),
                self.max_to_add
            );
        }
        if to_add == 0 {
            return 0;
        }

        let mut avoid = self.other_coords.clone();
        avoid.extend(self.coords.iter().copied());
        let new_coords = match self.pattern {
            GrowthPattern::Random => random_coords(&self.grid, to_add, &avoid, &mut self.rng),
            GrowthPattern::Spiral => spiral_coords(&self.grid, to_add, &avoid),
        };
        let added = new_coords.len();
        self.coords.extend(new_coords);
        added
    }

    /// Drops every coordinate, returning to [`AdditionState::NotStarted`].
    pub fn reset(&mut self) {
        self.coords.clear();
    }

    /// Adds cells claimed by another kind since this allocator was created.
    /// Cells this allocator already holds are left untouched.
    pub fn avoid(&mut self, coords: impl IntoIterator<Item = GridCoordinate>) {
        let own: HashSet<GridCoordinate> = self.coords.iter().copied().collect();
        self.other_coords
            .extend(coords.into_iter().filter(|c| !own.contains(c)));
    }

    /// Snapshot of the current coordinates with the given fraction equation.
    pub fn fractioned(&self, fraction_to_draw: Equation) -> FractionedCoordinates {
        FractionedCoordinates::new(self.coords.clone(), fraction_to_draw)
    }
}
