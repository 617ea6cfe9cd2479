#[cfg(test)]
mod tests {
    use crate::equation::Equation;
    use crate::molecule::PrecipitationMolecule;
    use crate::reaction::observer::{ObservedProgress, ProgressObserver};
    use crate::reaction::*;
    use std::collections::BTreeMap;

    use PrecipitationMolecule::{KnownReactant as A, Product as C, UnknownReactant as B};

    fn model_with(a: usize, b: usize, c: usize) -> ReactionProgressModel<PrecipitationMolecule> {
        ReactionProgressModel::with_counts(50, &[(A, a), (B, b), (C, c)])
    }

    #[test]
    fn reaction_mass_balance() {
        for n in 1..=5 {
            let mut model = model_with(10, 12, 1);
            let started = model.start_reaction_from_existing(&[(A, 1), (B, 2)], &[C], Some(n), 1.0, true);
            assert!(started);
            assert_eq!(model.molecule_counts(A), 10 - n);
            assert_eq!(model.molecule_counts(B), 12 - 2 * n);
            assert_eq!(model.molecule_counts(C), 1 + n);
        }
    }

    #[test]
    fn reaction_defaults_to_one_unit() {
        let mut model = model_with(3, 3, 0);
        assert!(model.start_reaction_from_existing(&[(A, 1), (B, 1)], &[C], None, 1.0, true));
        assert_eq!(model.counts(), BTreeMap::from([(A, 2), (B, 2), (C, 1)]));
    }

    #[test]
    fn insufficient_reactant_is_a_no_op() {
        let mut model = model_with(4, 3, 0);
        let before = model.counts();
        assert!(!model.start_reaction_from_existing(&[(A, 1), (B, 2)], &[C], Some(2), 1.0, true));
        assert_eq!(model.counts(), before);
        assert!(model.pending_events().is_empty());
        assert!(!model.start_reaction_from_existing(&[(A, 1)], &[C], Some(0), 1.0, true));
    }

    #[test]
    fn oversized_unit_count_is_a_no_op() {
        let mut model = model_with(4, 4, 0);
        let before = model.counts();
        assert!(!model.start_reaction_from_existing(&[(A, 1), (B, 2)], &[C], Some(usize::MAX), 1.0, true));
        assert!(!model.start_reaction_from_existing(&[], &[C], Some(usize::MAX), 1.0, true));
        assert_eq!(model.counts(), before);
        assert!(model.pending_events().is_empty());
    }

    #[test]
    fn reaction_respects_product_capacity() {
        let mut model = ReactionProgressModel::with_counts(5, &[(A, 5), (B, 5), (C, 4)]);
        assert!(!model.start_reaction_from_existing(&[(A, 1), (B, 1)], &[C], Some(2), 1.0, true));
        assert!(model.start_reaction_from_existing(&[(A, 1), (B, 1)], &[C], Some(1), 1.0, true));
        assert_eq!(model.molecule_counts(C), 5);
    }

    #[test]
    fn consumed_tokens_are_oldest_first() {
        let mut model = ReactionProgressModel::<PrecipitationMolecule>::new(10);
        model.add_molecules(A, 3, 1.0, 10);
        let ids: Vec<u64> = model.tokens(A).map(|t| t.id).collect();
        model.start_reaction_from_existing(&[(A, 2)], &[C], None, 1.0, true);
        let events = model.drain_events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].consumed[0], (A, ids[..2].to_vec()));
        assert_eq!(events[0].produced[0].0, C);
        assert_eq!(model.tokens(A).next().map(|t| t.id), Some(ids[2]));
        assert!(model.drain_events().is_empty());
    }

    #[test]
    fn add_molecules_respects_ceiling_and_staggers() {
        let mut model = ReactionProgressModel::<PrecipitationMolecule>::new(20);
        assert_eq!(model.add_molecules(A, 4, 2.0, 3), 3);
        assert_eq!(model.add_molecules(A, 4, 2.0, 3), 0);
        let delays: Vec<f64> = model
            .tokens(A)
            .map(|t| match t.animation {
                TokenAnimation::Appearing { delay, .. } => delay,
                TokenAnimation::Settled => -1.0,
            })
            .collect();
        let step = 2.0 / 3.0;
        for (i, d) in delays.iter().enumerate() {
            assert!((d - step * i as f64).abs() < 1e-12);
        }
        assert_eq!(model.add_molecules(B, 100, 1.0, usize::MAX), 20);
        assert!(!model.add_molecule(B));
    }

    #[test]
    fn queued_reaction_waits_for_running_animations() {
        let mut model = ReactionProgressModel::<PrecipitationMolecule>::new(10);
        model.add_molecules(A, 2, 1.5, 10);
        model.add_molecules(B, 2, 1.5, 10);
        assert!(model.start_reaction_from_existing(&[(A, 1), (B, 1)], &[C], None, 1.0, false));
        assert!(model.start_reaction_from_existing(&[(A, 1), (B, 1)], &[C], None, 1.0, true));
        let events = model.drain_events();
        assert_eq!(events[0].delay, 1.5);
        assert_eq!(events[1].delay, 0.0);
        assert_eq!(model.busy_for(), 2.5);
    }

    #[test]
    fn advance_settles_animations() {
        let mut model = ReactionProgressModel::<PrecipitationMolecule>::new(10);
        model.add_molecules(A, 2, 1.0, 10);
        model.advance(0.25);
        let anims: Vec<_> = model.tokens(A).map(|t| t.animation).collect();
        assert_eq!(anims[0], TokenAnimation::Appearing { delay: 0.0, duration: 0.25 });
        assert_eq!(anims[1], TokenAnimation::Appearing { delay: 0.25, duration: 0.5 });
        assert!(model.is_animating());
        model.advance(1.0);
        assert!(model.tokens(A).all(|t| t.animation == TokenAnimation::Settled));
        assert!(!model.is_animating());
    }

    #[test]
    fn copy_keeps_counts_and_freezes_original() {
        let mut model = ReactionProgressModel::<PrecipitationMolecule>::new(10);
        model.add_molecules(A, 3, 1.0, 10);
        model.start_reaction_from_existing(&[(A, 1)], &[C], None, 1.0, true);
        let mut next = model.copy();
        assert_eq!(next.counts(), model.counts());
        assert!(!next.is_animating());
        assert!(next.pending_events().is_empty());
        next.add_molecule(B);
        assert_eq!(model.molecule_counts(B), 0);
        assert_eq!(model.pending_events().len(), 1);
    }

    #[test]
    fn monotonic_reconciliation_converges() {
        let target = Equation::linear(0.0, 0.0, 1.0, 37.4);
        let mut model = ReactionProgressModel::<PrecipitationMolecule>::new(100);
        let mut last = 0;
        for step in 0..=40 {
            let input = step as f64 / 40.0;
            reconcile_additions(&mut model, A, &target, input);
            let count = model.molecule_counts(A);
            assert!(count >= last);
            last = count;
        }
        assert_eq!(model.molecule_counts(A), 37);
    }

    #[test]
    fn reconciliation_never_removes() {
        let mut model = ReactionProgressModel::with_counts(100, &[(A, 10)]);
        assert_eq!(reconcile_additions(&mut model, A, &Equation::constant(4.0), 0.0), 0);
        assert_eq!(model.molecule_counts(A), 10);
    }

    #[test]
    fn reaction_reconciliation_tracks_product() {
        let reaction = Reaction::new(&[(A, 1), (B, 1)], &[C]);
        let mut model = model_with(6, 4, 0);
        let target = Equation::linear(0.0, 0.0, 1.0, 6.0);
        let units = reconcile_reaction(&mut model, &reaction, C, &target, 0.5);
        assert_eq!(units, 3);
        // B runs out after 4 units even though 6 are wanted
        let units = reconcile_reaction(&mut model, &reaction, C, &target, 1.0);
        assert_eq!(units, 1);
        assert_eq!(model.counts(), BTreeMap::from([(A, 2), (B, 0), (C, 4)]));
    }

    #[derive(Default)]
    struct Recorder {
        snapshots: Vec<BTreeMap<PrecipitationMolecule, usize>>,
        reactions: usize,
    }

    impl ProgressObserver<PrecipitationMolecule> for Recorder {
        fn counts_changed(&mut self, counts: &BTreeMap<PrecipitationMolecule, usize>) {
            self.snapshots.push(counts.clone());
        }

        fn reaction_started(&mut self, event: &ReactionEvent<PrecipitationMolecule>) {
            self.reactions += event.units;
        }
    }

    #[test]
    fn observer_sees_only_real_changes() {
        let mut observed = ObservedProgress::new(ReactionProgressModel::new(4), Recorder::default());
        observed.add_molecules(A, 2, 1.0, 4);
        observed.add_molecules(B, 2, 1.0, 4);
        observed.add_molecules(B, 2, 1.0, 2);
        let reaction = Reaction::new(&[(A, 1), (B, 1)], &[C]);
        assert!(observed.start_reaction(&reaction, 2));
        assert!(!observed.start_reaction(&reaction, 1));
        let recorder = observed.observer();
        assert_eq!(recorder.snapshots.len(), 3);
        assert_eq!(recorder.reactions, 2);
        assert_eq!(recorder.snapshots[2][&C], 2);
        assert!(observed.model().pending_events().is_empty());
    }
}
