// experiment/tests.rs
// Scenario tests for the experiments

#[cfg(test)]
mod tests {
    use crate::chemistry::pka;
    use crate::experiment::buffer::{BufferExperiment, BufferSettings, BufferStep};
    use crate::experiment::dissociation::{DissociationExperiment, DissociationSettings};
    use crate::experiment::precipitation::{
        LimitingReactant, PrecipitationExperiment, PrecipitationSettings, PrecipitationStep,
    };
    use crate::experiment::titration::{
        TitrationComponents, TitrationExperiment, TitrationPhase, TitrationSettings,
    };
    use crate::grid::Grid;
    use crate::molecule::{AcidBaseMolecule, PrecipitationMolecule, TitrationMolecule};

    fn acetic_dissociation(substance: usize) -> DissociationExperiment {
        let settings = DissociationSettings {
            ka: 1.8e-5,
            initial_concentration: 0.1,
            grid: Grid::new(10, 10),
            ..Default::default()
        };
        let mut experiment = DissociationExperiment::new(settings);
        assert_eq!(experiment.add_substance(substance), substance);
        assert!(experiment.start_dissociation());
        experiment
    }

    #[test]
    fn weak_acid_dissociation_matches_prediction() {
        let mut experiment = acetic_dissociation(40);
        let mut last = 0;
        for i in 0..=20 {
            experiment.set_progress(i as f64 / 20.0);
            let primary = experiment.dissociation().unwrap().model.molecule_counts(AcidBaseMolecule::PrimaryIon);
            assert!(primary >= last, "ion count fell from {last} to {primary}");
            last = primary;
        }
        let phase = experiment.dissociation().unwrap();

        let predicted = phase.components.ion_count_equation().evaluate(1.0);
        let primary = phase.model.molecule_counts(AcidBaseMolecule::PrimaryIon) as f64;
        assert!((primary - predicted).abs() <= 1.0, "{primary} vs {predicted}");
        assert_eq!(
            phase.model.molecule_counts(AcidBaseMolecule::PrimaryIon),
            phase.model.molecule_counts(AcidBaseMolecule::SecondaryIon)
        );
        assert_eq!(phase.model.total(), 40 + phase.model.molecule_counts(AcidBaseMolecule::PrimaryIon));
        assert!((phase.ph() - 2.87).abs() < 0.01, "pH was {}", phase.ph());
    }

    #[test]
    fn dissociation_needs_enough_substance() {
        let mut experiment = DissociationExperiment::new(DissociationSettings::default());
        experiment.add_substance(5);
        assert!(!experiment.start_dissociation());
        assert_eq!(experiment.set_progress(1.0), 0);
        assert!(experiment.dissociation().is_none());
    }

    #[test]
    fn dissociation_beaker_never_shares_cells() {
        let settings = DissociationSettings {
            ka: 6.8e-4,
            initial_concentration: 0.01,
            ..Default::default()
        };
        let mut experiment = DissociationExperiment::new(settings);
        experiment.add_substance(60);
        assert!(experiment.start_dissociation());
        let phase = experiment.dissociation().unwrap();

        for i in 0..=10 {
            let progress = i as f64 / 10.0;
            let beaker = phase.beaker(progress);
            assert!(!beaker.has_collisions(), "collision at progress {progress}");
            assert_eq!(
                beaker.count(AcidBaseMolecule::Substance) + beaker.count(AcidBaseMolecule::PrimaryIon),
                60
            );
        }
        let end = phase.beaker(1.0);
        assert!(end.count(AcidBaseMolecule::PrimaryIon) > 0);
        assert_eq!(
            end.count(AcidBaseMolecule::PrimaryIon),
            end.count(AcidBaseMolecule::SecondaryIon)
        );
    }

    #[test]
    fn full_grid_keeps_cells_for_every_ion() {
        let settings = |max_substance| DissociationSettings {
            ka: 6.8e-4,
            initial_concentration: 0.1,
            grid: Grid::new(10, 10),
            max_substance,
            ..Default::default()
        };
        assert!(settings(100).validate().is_err());
        let largest = (1..=100).rev().find(|&n| settings(n).validate().is_ok()).unwrap();
        assert!(largest < 100);

        let mut experiment = DissociationExperiment::new(settings(largest));
        assert_eq!(experiment.add_substance(largest), largest);
        assert!(experiment.start_dissociation());
        let phase = experiment.dissociation().unwrap();
        for i in 0..=10 {
            let beaker = phase.beaker(i as f64 / 10.0);
            assert!(!beaker.has_collisions());
            assert_eq!(
                beaker.count(AcidBaseMolecule::PrimaryIon),
                beaker.count(AcidBaseMolecule::SecondaryIon)
            );
        }

        experiment.set_progress(1.0);
        let phase = experiment.dissociation().unwrap();
        let primary = phase.model.molecule_counts(AcidBaseMolecule::PrimaryIon);
        assert!(primary > 0);
        assert_eq!(phase.beaker(1.0).count(AcidBaseMolecule::PrimaryIon), primary);
        assert_eq!(phase.beaker(1.0).count(AcidBaseMolecule::SecondaryIon), primary);
    }

    #[test]
    fn going_back_restores_the_adding_phase() {
        let mut experiment = acetic_dissociation(40);
        experiment.set_progress(1.0);
        assert!(experiment.can_go_back());
        experiment.back();
        assert!(experiment.dissociation().is_none());
        assert_eq!(experiment.add_substance(5), 5);
    }

    fn buffer_with_salt() -> BufferExperiment {
        let mut experiment = BufferExperiment::new(BufferSettings::default());
        experiment.add_substance(40);
        assert!(experiment.start_salt());
        assert_eq!(experiment.add_salt(40), 40);
        experiment
    }

    #[test]
    fn equal_salt_and_substance_buffers_at_pka() {
        let mut experiment = buffer_with_salt();
        let ph = experiment.ph().unwrap();
        assert!((ph - pka(1.8e-5)).abs() < 0.1, "pH was {ph}");

        let model = experiment.model().unwrap();
        assert_eq!(model.molecule_counts(AcidBaseMolecule::Substance), 40);
        assert_eq!(model.molecule_counts(AcidBaseMolecule::PrimaryIon), 0);
        assert_eq!(model.molecule_counts(AcidBaseMolecule::SecondaryIon), 40);
        assert_eq!(experiment.add_salt(1), 0);
    }

    #[test]
    fn strong_substance_converts_salt_then_accumulates() {
        let mut experiment = buffer_with_salt();
        assert!(experiment.start_strong());
        let start_ph = experiment.ph().unwrap();

        experiment.add_strong(20);
        let model = experiment.model().unwrap();
        assert_eq!(model.molecule_counts(AcidBaseMolecule::Substance), 60);
        assert_eq!(model.molecule_counts(AcidBaseMolecule::SecondaryIon), 20);
        assert_eq!(model.molecule_counts(AcidBaseMolecule::PrimaryIon), 0);
        assert!(experiment.ph().unwrap() < start_ph);

        experiment.add_strong(30);
        let model = experiment.model().unwrap();
        assert_eq!(model.molecule_counts(AcidBaseMolecule::Substance), 80);
        assert_eq!(model.molecule_counts(AcidBaseMolecule::SecondaryIon), 0);
        assert_eq!(model.molecule_counts(AcidBaseMolecule::PrimaryIon), 10);

        let BufferStep::StrongSubstance(phase) = experiment.step() else {
            panic!("expected the strong substance phase");
        };
        assert!((-phase.ph_equation()).is_monotonic_on(0.0, 80.0, 161));
    }

    #[test]
    fn titration_curve_is_continuous_and_rising() {
        let components = TitrationComponents::new(1.8e-5, 0.1, 30);
        let curve = components.ph_curve();
        let ep = components.equivalence_point();

        assert!((curve.evaluate(ep - 1e-9) - curve.evaluate(ep)).abs() < 1e-6);
        assert!((curve.evaluate(ep) - components.equivalence_ph()).abs() < 1e-9);
        assert!(curve.is_monotonic_on(0.0, 2.0 * ep, 241));
        assert!((curve.evaluate(0.0) - components.initial_ph()).abs() < 1e-3);
        assert!((curve.evaluate(ep / 2.0) - pka(1.8e-5)).abs() < 0.05);
        assert!(components.equivalence_ph() > 7.0);

        let series = components.sample_curve(30, 61);
        assert_eq!(series.len(), 61);
        assert_eq!(series.last().unwrap().x, 60.0);
    }

    #[test]
    fn dilute_titration_brackets_neutral() {
        let components = TitrationComponents::new(1e-3, 1e-6, 20);
        assert!(components.initial_ph() <= 7.0);
        assert!(components.equivalence_ph() >= 7.0);
        assert!(components.initial_ph() <= components.equivalence_ph());

        let curve = components.ph_curve();
        assert!(curve.is_monotonic_on(0.0, 40.0, 81));
        assert!((curve.evaluate(20.0) - components.equivalence_ph()).abs() < 1e-9);

        let mut experiment = TitrationExperiment::new(TitrationSettings {
            ka: 1e-3,
            initial_concentration: 1e-6,
            ..Default::default()
        });
        experiment.add_substance(20);
        assert!(experiment.start_titration());
        experiment.add_titrant(10);
        let ph = experiment.ph().unwrap();
        assert!(ph.is_finite() && ph > 0.0 && ph < 14.0, "pH was {ph}");
    }

    #[test]
    fn titration_phases_track_molecules() {
        let mut experiment = TitrationExperiment::new(TitrationSettings::default());
        assert_eq!(experiment.add_titrant(5), 0);
        experiment.add_substance(30);
        assert!(experiment.start_titration());

        assert_eq!(experiment.add_titrant(100), 30);
        let model = experiment.model().unwrap();
        assert_eq!(model.molecule_counts(TitrationMolecule::Substance), 0);
        assert_eq!(model.molecule_counts(TitrationMolecule::SecondaryIon), 30);

        assert!(experiment.pass_equivalence());
        assert_eq!(experiment.add_titrant(10), 10);
        assert_eq!(experiment.model().unwrap().molecule_counts(TitrationMolecule::Titrant), 10);
        assert!(experiment.ph().unwrap() > experiment.components().unwrap().equivalence_ph());

        assert!(matches!(experiment.back(), TitrationPhase::PreEquivalence(p) if p.at_equivalence()));
    }

    #[test]
    fn titration_cannot_skip_equivalence() {
        let mut experiment = TitrationExperiment::new(TitrationSettings::default());
        experiment.add_substance(20);
        experiment.start_titration();
        experiment.add_titrant(19);
        assert!(!experiment.pass_equivalence());
    }

    fn precipitation(known: usize, unknown: usize) -> PrecipitationExperiment {
        let mut experiment = PrecipitationExperiment::new(PrecipitationSettings::default());
        assert_eq!(experiment.add_reactant(known), known);
        assert!(experiment.next());
        assert_eq!(experiment.add_reactant(unknown), unknown);
        assert!(experiment.next());
        experiment
    }

    #[test]
    fn precipitation_conserves_reacting_units() {
        let mut experiment = precipitation(25, 15);
        let PrecipitationStep::React(phase) = experiment.step() else {
            panic!("expected the react phase");
        };
        assert_eq!(phase.limiting_reactant(), LimitingReactant::Unknown);
        assert!(!phase.beaker(0.5).has_collisions());

        experiment.set_progress(1.0);
        let model = experiment.model().unwrap();
        let product = model.molecule_counts(PrecipitationMolecule::Product);
        assert_eq!(product, 15);
        assert_eq!(25 - model.molecule_counts(PrecipitationMolecule::KnownReactant), product);
        assert_eq!(15 - model.molecule_counts(PrecipitationMolecule::UnknownReactant), product);

        let PrecipitationStep::React(phase) = experiment.step() else {
            panic!("expected the react phase");
        };
        assert_eq!(phase.precipitate_at(1.0).len(), 15);
        assert_eq!(phase.beaker(1.0).count(PrecipitationMolecule::KnownReactant), 10);

        let molar_mass = experiment.estimated_unknown_molar_mass().unwrap();
        assert!((molar_mass - 208.23).abs() < 1e-9);
        assert!(!experiment.next());
    }

    #[test]
    fn precipitate_grid_must_fit_every_product() {
        let crowded = PrecipitationSettings {
            max_known: 50,
            max_unknown: 50,
            ..Default::default()
        };
        assert!(crowded.validate().is_err());

        let settings = PrecipitationSettings {
            precipitate_grid: Grid::new(8, 8),
            ..crowded
        };
        assert!(settings.validate().is_ok());

        let mut experiment = PrecipitationExperiment::new(settings);
        assert_eq!(experiment.add_reactant(50), 50);
        assert!(experiment.next());
        assert_eq!(experiment.add_reactant(50), 50);
        assert!(experiment.next());
        experiment.set_progress(1.0);

        let product = experiment.model().unwrap().molecule_counts(PrecipitationMolecule::Product);
        assert_eq!(product, 50);
        let PrecipitationStep::React(phase) = experiment.step() else {
            panic!("expected the react phase");
        };
        assert_eq!(phase.precipitate_at(1.0).len(), product);
    }

    #[test]
    fn leftover_unknown_reacts_after_extra_known() {
        let mut experiment = precipitation(12, 20);
        experiment.set_progress(1.0);
        assert!(experiment.estimated_unknown_molar_mass().is_none());
        assert!(experiment.next());

        experiment.add_reactant(5);
        assert!(!experiment.next());
        experiment.add_reactant(5);
        assert!(experiment.next());

        let PrecipitationStep::FinalReact(phase) = experiment.step() else {
            panic!("expected the final react phase");
        };
        assert_eq!(phase.units(), 8);
        assert!(!phase.beaker(0.5).has_collisions());

        experiment.set_progress(1.0);
        let model = experiment.model().unwrap();
        assert_eq!(model.molecule_counts(PrecipitationMolecule::Product), 20);
        assert_eq!(model.molecule_counts(PrecipitationMolecule::UnknownReactant), 0);
        assert_eq!(model.molecule_counts(PrecipitationMolecule::KnownReactant), 2);

        let molar_mass = experiment.estimated_unknown_molar_mass().unwrap();
        assert!((molar_mass - 208.23).abs() < 1e-9);
    }
}
