// phase/mod.rs
// Linear navigation through experiment phases with snapshot-based undo

use log::debug;

/// An ordered chain of experiment phases.
///
/// Every phase reached so far is kept as an immutable snapshot, so going
/// back simply returns to an older value. There is always a current phase.
#[derive(Clone, Debug)]
pub struct PhaseChain<P: Clone> {
    phases: Vec<P>,
    saved: Option<(usize, P)>,
}

impl<P: Clone> PhaseChain<P> {
    pub fn new(initial: P) -> Self {
        Self {
            phases: vec![initial],
            saved: None,
        }
    }

    pub fn current(&self) -> &P {
        // never empty: `back` refuses to pop the first phase
        &self.phases[self.phases.len() - 1]
    }

    pub fn current_mut(&mut self) -> &mut P {
        let last = self.phases.len() - 1;
        &mut self.phases[last]
    }

    /// Number of phases reached, including the current one.
    pub fn len(&self) -> usize {
        self.phases.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn history(&self) -> &[P] {
        &self.phases
    }

    /// Moves forward; the current phase stays behind as a snapshot.
    pub fn advance(&mut self, next: P) {
        self.phases.push(next);
        debug!("advanced to phase {}", self.phases.len());
    }

    /// Builds the next phase from the current one and moves to it.
    pub fn advance_with(&mut self, build: impl FnOnce(&P) -> P) {
        let next = build(self.current());
        self.advance(next);
    }

    pub fn can_go_back(&self) -> bool {
        self.phases.len() > 1
    }

    /// Discards the current phase and returns to the previous snapshot.
    /// Going back from the first phase is a navigation bug and panics.
    pub fn back(&mut self) -> &P {
        assert!(self.can_go_back(), "no earlier phase to go back to");
        self.phases.pop();
        debug!("went back to phase {}", self.phases.len());
        self.current()
    }

    /// Remembers the current phase so a later [`PhaseChain::restore`]
    /// can return to it even after edits in place.
    pub fn save(&mut self) {
        self.saved = Some((self.phases.len(), self.current().clone()));
    }

    pub fn has_saved(&self) -> bool {
        self.saved.is_some()
    }

    /// Returns to the saved snapshot, dropping any phases reached since.
    /// Restoring without a saved snapshot panics.
    pub fn restore(&mut self) -> &P {
        let Some((depth, snapshot)) = self.saved.take() else {
            panic!("restore called without a saved phase");
        };
        self.phases.truncate(depth);
        let last = self.phases.len() - 1;
        self.phases[last] = snapshot;
        self.current()
    }
}
