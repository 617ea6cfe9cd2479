// reaction/observer.rs
// Thin adapter that keeps observable state outside the progress model

use std::collections::BTreeMap;

use super::progress::{ReactionEvent, ReactionProgressModel};
use super::reconcile::{reconcile_additions, reconcile_reaction, Reaction};
use crate::equation::Equation;
use crate::molecule::MoleculeKind;

/// Receives notifications after the wrapped model changes.
pub trait ProgressObserver<K: MoleculeKind> {
    fn counts_changed(&mut self, counts: &BTreeMap<K, usize>);

    fn reaction_started(&mut self, _event: &ReactionEvent<K>) {}
}

/// Wraps a [`ReactionProgressModel`] and notifies an observer whenever a
/// mutation actually changed something.
pub struct ObservedProgress<K: MoleculeKind, O: ProgressObserver<K>> {
    model: ReactionProgressModel<K>,
    observer: O,
}

impl<K: MoleculeKind, O: ProgressObserver<K>> ObservedProgress<K, O> {
    pub fn new(model: ReactionProgressModel<K>, observer: O) -> Self {
        Self { model, observer }
    }

    pub fn model(&self) -> &ReactionProgressModel<K> {
        &self.model
    }

    pub fn observer(&self) -> &O {
        &self.observer
    }

    pub fn into_parts(self) -> (ReactionProgressModel<K>, O) {
        (self.model, self.observer)
    }

    fn notify(&mut self) {
        let counts = self.model.counts();
        self.observer.counts_changed(&counts);
        for event in self.model.pending_events() {
            self.observer.reaction_started(event);
        }
        // the view layer has seen these now
        self.model.drain_events();
    }

    pub fn add_molecules(&mut self, kind: K, count: usize, duration: f64, ceiling: usize) -> usize {
        let added = self.model.add_molecules(kind, count, duration, ceiling);
        if added > 0 {
            self.notify();
        }
        added
    }

    pub fn start_reaction(&mut self, reaction: &Reaction<K>, units: usize) -> bool {
        let started = reaction.run(&mut self.model, units);
        if started {
            self.notify();
        }
        started
    }

    pub fn reconcile_additions(&mut self, kind: K, target: &Equation, input: f64) -> usize {
        let added = reconcile_additions(&mut self.model, kind, target, input);
        if added > 0 {
            self.notify();
        }
        added
    }

    pub fn reconcile_reaction(&mut self, reaction: &Reaction<K>, tracked: K, target: &Equation, input: f64) -> usize {
        let units = reconcile_reaction(&mut self.model, reaction, tracked, target, input);
        if units > 0 {
            self.notify();
        }
        units
    }

    pub fn advance(&mut self, elapsed: f64) {
        self.model.advance(elapsed);
    }
}
