// grid/fractioned.rs
// Coordinates drawn as a growing or shrinking prefix of a fixed list

use serde::{Deserialize, Serialize};

use super::coordinate::GridCoordinate;
use crate::equation::Equation;

/// A fixed coordinate list plus the fraction of it to draw at a given input.
///
/// Populations grow and shrink smoothly by drawing a prefix of the same
/// list, so a molecule never jumps to a new cell while the input moves.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FractionedCoordinates {
    pub coords: Vec<GridCoordinate>,
    pub fraction_to_draw: Equation,
}

impl FractionedCoordinates {
    pub fn new(coords: Vec<GridCoordinate>, fraction_to_draw: Equation) -> Self {
        Self {
            coords,
            fraction_to_draw,
        }
    }

    /// Every coordinate, always drawn in full.
    pub fn full(coords: Vec<GridCoordinate>) -> Self {
        Self::new(coords, Equation::constant(1.0))
    }

    pub fn count_at(&self, x: f64) -> usize {
        let fraction = self.fraction_to_draw.evaluate(x);
        let fraction = if fraction.is_nan() { 0.0 } else { fraction.clamp(0.0, 1.0) };
        ((fraction * self.coords.len() as f64).round() as usize).min(self.coords.len())
    }

    pub fn coords_at(&self, x: f64) -> &[GridCoordinate] {
        &self.coords[..self.count_at(x)]
    }
}
