// reaction/reconcile.rs
// Drives a progress model forward to match counts implied by equations

use log::debug;
use smallvec::SmallVec;

use super::progress::ReactionProgressModel;
use crate::config;
use crate::equation::Equation;
use crate::molecule::MoleculeKind;

/// A reaction that converts molecules of some kinds into others.
#[derive(Clone, Debug, PartialEq)]
pub struct Reaction<K: MoleculeKind> {
    pub consuming: SmallVec<[(K, usize); 2]>,
    pub producing: SmallVec<[K; 2]>,
    pub duration: f64,
    pub eager: bool,
}

impl<K: MoleculeKind> Reaction<K> {
    pub fn new(consuming: &[(K, usize)], producing: &[K]) -> Self {
        Self {
            consuming: SmallVec::from_slice(consuming),
            producing: SmallVec::from_slice(producing),
            duration: config::REACTION_DURATION,
            eager: true,
        }
    }

    pub fn with_duration(mut self, duration: f64) -> Self {
        self.duration = duration;
        self
    }

    /// Queue behind running animations instead of starting immediately.
    pub fn queued(mut self) -> Self {
        self.eager = false;
        self
    }

    pub fn run(&self, model: &mut ReactionProgressModel<K>, units: usize) -> bool {
        model.start_reaction_from_existing(
            &self.consuming,
            &self.producing,
            Some(units),
            self.duration,
            self.eager,
        )
    }
}

/// Adds molecules of `kind` until its count reaches `round(target(input))`.
///
/// Counts are only ever driven forward: if the model already holds at
/// least the target, nothing happens. Targets must therefore be monotonic
/// in `input` within a phase. Returns the number of molecules added.
pub fn reconcile_additions<K: MoleculeKind>(
    model: &mut ReactionProgressModel<K>,
    kind: K,
    target: &Equation,
    input: f64,
) -> usize {
    let desired = target.evaluate_count(input);
    let current = model.molecule_counts(kind);
    let mut added = 0;
    for _ in current..desired {
        if !model.add_molecule(kind) {
            debug!("stopped reconciling {} at {} of {}", kind.name(), current + added, desired);
            break;
        }
        added += 1;
    }
    added
}

/// Runs `reaction` one unit at a time until the count of `tracked`
/// reaches `round(target(input))`, stopping early if a unit cannot run.
/// Returns the number of units run.
pub fn reconcile_reaction<K: MoleculeKind>(
    model: &mut ReactionProgressModel<K>,
    reaction: &Reaction<K>,
    tracked: K,
    target: &Equation,
    input: f64,
) -> usize {
    assert!(
        reaction.producing.contains(&tracked),
        "{} is not produced by the reaction",
        tracked.name()
    );
    let desired = target.evaluate_count(input);
    let current = model.molecule_counts(tracked);
    let mut units = 0;
    for _ in current..desired {
        if !reaction.run(model, 1) {
            debug!(
                "stopped reaction towards {} {} after {} units",
                desired,
                tracked.name(),
                units
            );
            break;
        }
        units += 1;
    }
    units
}
