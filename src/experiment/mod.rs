// experiment/mod.rs
// Experiment components built from equations, grid allocation and reaction progress

pub mod buffer;
pub mod dissociation;
pub mod precipitation;
pub mod titration;

use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

use crate::grid::GridCoordinate;
use crate::molecule::MoleculeKind;

/// Where every molecule is drawn at one input value.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BeakerSnapshot<K: MoleculeKind> {
    pub molecules: BTreeMap<K, Vec<GridCoordinate>>,
}

impl<K: MoleculeKind> BeakerSnapshot<K> {
    pub fn new() -> Self {
        Self {
            molecules: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, kind: K, coords: &[GridCoordinate]) {
        self.molecules.entry(kind).or_default().extend_from_slice(coords);
    }

    pub fn count(&self, kind: K) -> usize {
        self.molecules.get(&kind).map_or(0, |c| c.len())
    }

    /// True if any cell holds more than one molecule, of any kinds.
    pub fn has_collisions(&self) -> bool {
        let mut seen = HashSet::new();
        self.molecules
            .values()
            .flatten()
            .any(|c| !seen.insert(*c))
    }
}

impl<K: MoleculeKind> Default for BeakerSnapshot<K> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests;
