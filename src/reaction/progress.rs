// reaction/progress.rs
// Discrete molecule population per kind, with declarative animation state

use log::debug;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::{BTreeMap, VecDeque};

use crate::config;
use crate::molecule::MoleculeKind;

/// How a token is currently being shown. Timing is declarative: the model
/// only records delays and durations, the view layer interpolates.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum TokenAnimation {
    Appearing { delay: f64, duration: f64 },
    Settled,
}

impl TokenAnimation {
    fn advanced(self, elapsed: f64) -> Self {
        match self {
            TokenAnimation::Appearing { delay, duration } => {
                let end = delay + duration - elapsed;
                if end <= 0.0 {
                    TokenAnimation::Settled
                } else {
                    let delay = (delay - elapsed).max(0.0);
                    TokenAnimation::Appearing {
                        delay,
                        duration: end - delay,
                    }
                }
            }
            TokenAnimation::Settled => TokenAnimation::Settled,
        }
    }
}

/// One animated molecule on screen.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MoleculeToken {
    pub id: u64,
    pub animation: TokenAnimation,
}

/// A reaction started by [`ReactionProgressModel::start_reaction_from_existing`],
/// kept until the view layer drains it.
#[derive(Clone, Debug, PartialEq)]
pub struct ReactionEvent<K: MoleculeKind> {
    pub consumed: SmallVec<[(K, Vec<u64>); 2]>,
    pub produced: SmallVec<[(K, Vec<u64>); 2]>,
    pub units: usize,
    pub delay: f64,
    pub duration: f64,
}

/// Keeps a discrete count of molecules per kind and moves molecules
/// between kinds as reactions run.
///
/// Counts change synchronously on every call. Requests that cannot be
/// honoured (capacity reached, not enough reactant) are silent no-ops that
/// report what happened through their return value.
#[derive(Clone, Debug)]
pub struct ReactionProgressModel<K: MoleculeKind> {
    molecules: BTreeMap<K, VecDeque<MoleculeToken>>,
    max_per_kind: usize,
    /// Time until every scheduled animation has finished.
    busy_for: f64,
    next_id: u64,
    events: Vec<ReactionEvent<K>>,
}

impl<K: MoleculeKind> ReactionProgressModel<K> {
    pub fn new(max_per_kind: usize) -> Self {
        assert!(max_per_kind > 0, "progress model needs room for at least one molecule");
        Self {
            molecules: K::ALL.iter().map(|k| (*k, VecDeque::new())).collect(),
            max_per_kind,
            busy_for: 0.0,
            next_id: 0,
            events: Vec::new(),
        }
    }

    /// Starts with already-settled molecules, e.g. carried over from a
    /// previous phase. Counts above `max_per_kind` are clamped.
    pub fn with_counts(max_per_kind: usize, counts: &[(K, usize)]) -> Self {
        let mut model = Self::new(max_per_kind);
        for &(kind, count) in counts {
            let room = max_per_kind - model.molecule_counts(kind);
            for _ in 0..count.min(room) {
                let token = model.token(TokenAnimation::Settled);
                model.column_mut(kind).push_back(token);
            }
        }
        model
    }

    pub fn max_per_kind(&self) -> usize {
        self.max_per_kind
    }

    pub fn molecule_counts(&self, kind: K) -> usize {
        self.molecules.get(&kind).map_or(0, |c| c.len())
    }

    pub fn counts(&self) -> BTreeMap<K, usize> {
        self.molecules.iter().map(|(k, c)| (*k, c.len())).collect()
    }

    pub fn total(&self) -> usize {
        self.molecules.values().map(|c| c.len()).sum()
    }

    /// Tokens of `kind`, oldest first.
    pub fn tokens(&self, kind: K) -> impl Iterator<Item = &MoleculeToken> {
        self.molecules.get(&kind).into_iter().flatten()
    }

    pub fn is_animating(&self) -> bool {
        self.busy_for > 0.0
    }

    /// Time until every scheduled animation has finished.
    pub fn busy_for(&self) -> f64 {
        self.busy_for
    }

    fn column_mut(&mut self, kind: K) -> &mut VecDeque<MoleculeToken> {
        self.molecules.entry(kind).or_default()
    }

    fn token(&mut self, animation: TokenAnimation) -> MoleculeToken {
        let id = self.next_id;
        self.next_id += 1;
        MoleculeToken { id, animation }
    }

    /// Adds one molecule of `kind`. Returns `false` at capacity.
    pub fn add_molecule(&mut self, kind: K) -> bool {
        self.add_molecules(kind, 1, config::MOLECULE_APPEAR_DURATION, usize::MAX) == 1
    }

    /// Adds up to `count` molecules, staggering their appearance across
    /// `duration`. The count of `kind` never exceeds `ceiling` nor the model
    /// capacity. Returns how many were added.
    pub fn add_molecules(&mut self, kind: K, count: usize, duration: f64, ceiling: usize) -> usize {
        let limit = ceiling.min(self.max_per_kind);
        let room = limit.saturating_sub(self.molecule_counts(kind));
        let to_add = count.min(room);
        if to_add < count {
            debug!(
                "adding {} of {} clamped to {} (limit {})",
                count,
                kind.name(),
                to_add,
                limit
            );
        }
        if to_add == 0 {
            return 0;
        }

        let step = duration / to_add as f64;
        for i in 0..to_add {
            let token = self.token(TokenAnimation::Appearing {
                delay: step * i as f64,
                duration: step,
            });
            self.column_mut(kind).push_back(token);
        }
        self.busy_for = self.busy_for.max(duration);
        to_add
    }

    /// Runs `count` reaction units (one when `None`). Each unit removes
    /// `multiplier` molecules of every consumed kind, oldest first, and adds
    /// one molecule of every produced kind.
    ///
    /// The call is all or nothing: if any consumed kind is short, or a
    /// produced kind would exceed capacity, nothing changes and `false` is
    /// returned. Eager reactions animate immediately; others wait for the
    /// animations already scheduled.
    pub fn start_reaction_from_existing(
        &mut self,
        consuming: &[(K, usize)],
        producing: &[K],
        count: Option<usize>,
        duration: f64,
        eager_reaction: bool,
    ) -> bool {
        let units = count.unwrap_or(1);
        if units == 0 {
            return false;
        }

        let mut required: BTreeMap<K, usize> = BTreeMap::new();
        for &(kind, multiplier) in consuming {
            let needed = multiplier
                .checked_mul(units)
                .and_then(|n| n.checked_add(required.get(&kind).copied().unwrap_or(0)));
            let Some(needed) = needed else {
                debug!("skipped reaction of {} units: {} overflows", units, kind.name());
                return false;
            };
            required.insert(kind, needed);
        }
        for (&kind, &needed) in &required {
            if self.molecule_counts(kind) < needed {
                debug!(
                    "skipped reaction of {} units: need {} {}, have {}",
                    units,
                    needed,
                    kind.name(),
                    self.molecule_counts(kind)
                );
                return false;
            }
        }

        let mut produced: BTreeMap<K, usize> = BTreeMap::new();
        for &kind in producing {
            *produced.entry(kind).or_default() += 1;
        }
        for (&kind, &per_unit) in &produced {
            let remaining = self.molecule_counts(kind) - required.get(&kind).copied().unwrap_or(0);
            let after = per_unit.checked_mul(units).and_then(|n| n.checked_add(remaining));
            if after.map_or(true, |after| after > self.max_per_kind) {
                debug!(
                    "skipped reaction of {} units: {} would exceed {}",
                    units,
                    kind.name(),
                    self.max_per_kind
                );
                return false;
            }
        }

        let delay = if eager_reaction { 0.0 } else { self.busy_for };

        let mut consumed: SmallVec<[(K, Vec<u64>); 2]> = SmallVec::new();
        for &(kind, multiplier) in consuming {
            let column = self.column_mut(kind);
            let ids = column.drain(..multiplier * units).map(|t| t.id).collect();
            consumed.push((kind, ids));
        }

        let mut produced: SmallVec<[(K, Vec<u64>); 2]> = SmallVec::new();
        for &kind in producing {
            let mut ids = Vec::with_capacity(units);
            for _ in 0..units {
                let token = self.token(TokenAnimation::Appearing { delay, duration });
                ids.push(token.id);
                self.column_mut(kind).push_back(token);
            }
            produced.push((kind, ids));
        }

        self.busy_for = self.busy_for.max(delay + duration);
        self.events.push(ReactionEvent {
            consumed,
            produced,
            units,
            delay,
            duration,
        });
        true
    }

    /// Moves the logical animation clock forward.
    pub fn advance(&mut self, elapsed: f64) {
        if elapsed <= 0.0 {
            return;
        }
        for column in self.molecules.values_mut() {
            for token in column.iter_mut() {
                token.animation = token.animation.advanced(elapsed);
            }
        }
        self.busy_for = (self.busy_for - elapsed).max(0.0);
    }

    /// Hands recorded reaction events to the view layer.
    pub fn drain_events(&mut self) -> Vec<ReactionEvent<K>> {
        std::mem::take(&mut self.events)
    }

    pub fn pending_events(&self) -> &[ReactionEvent<K>] {
        &self.events
    }

    /// Duplicate for the next phase: same molecules, every animation
    /// settled and no pending events. `self` is left untouched so it can be
    /// kept as the snapshot for back navigation.
    pub fn copy(&self) -> Self {
        let mut copy = self.clone();
        for column in copy.molecules.values_mut() {
            for token in column.iter_mut() {
                token.animation = TokenAnimation::Settled;
            }
        }
        copy.busy_for = 0.0;
        copy.events.clear();
        copy
    }

    /// Removes every molecule, keeping the capacity.
    pub fn reset(&mut self) {
        for column in self.molecules.values_mut() {
            column.clear();
        }
        self.busy_for = 0.0;
        self.events.clear();
    }
}

impl<K: MoleculeKind> Default for ReactionProgressModel<K> {
    fn default() -> Self {
        Self::new(config::DEFAULT_MAX_MOLECULES_PER_KIND)
    }
}
