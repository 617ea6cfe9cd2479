// experiment/dissociation.rs
// Weak acid dissociation, HA ⇌ H⁺ + A⁻, over a normalized reaction progress

use log::info;
use serde::{Deserialize, Serialize};

use super::BeakerSnapshot;
use crate::chemistry::{weak_acid_ion_concentration, MoleculeScale};
use crate::config;
use crate::equation::Equation;
use crate::grid::{Grid, GridCoordinate, GrowthPattern, LimitedGridCoords};
use crate::molecule::AcidBaseMolecule;
use crate::phase::PhaseChain;
use crate::reaction::{reconcile_reaction, Reaction, ReactionProgressModel};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DissociationSettings {
    pub ka: f64,
    pub initial_concentration: f64,
    pub grid: Grid,
    pub min_substance: usize,
    pub max_substance: usize,
    pub seed: u64,
}

impl Default for DissociationSettings {
    fn default() -> Self {
        Self {
            ka: 1.8e-5,
            initial_concentration: 0.1,
            grid: Grid::new(config::DEFAULT_GRID_ROWS, config::DEFAULT_GRID_COLS),
            min_substance: 20,
            max_substance: 60,
            seed: config::DEFAULT_SEED,
        }
    }
}

impl DissociationSettings {
    pub fn validate(&self) -> Result<(), String> {
        if !(self.ka.is_finite() && self.ka > 0.0) {
            return Err(format!("Ka must be positive, got {}", self.ka));
        }
        if !(self.initial_concentration.is_finite() && self.initial_concentration > 0.0) {
            return Err(format!(
                "initial concentration must be positive, got {}",
                self.initial_concentration
            ));
        }
        if self.min_substance > self.max_substance {
            return Err(format!(
                "min_substance ({}) exceeds max_substance ({})",
                self.min_substance, self.max_substance
            ));
        }
        if self.min_substance > self.grid.size() {
            return Err(format!(
                "grid {}x{} cannot hold {} substance molecules",
                self.grid.rows, self.grid.cols, self.min_substance
            ));
        }
        let ion_slots =
            DissociationComponents::new(self.ka, self.initial_concentration, self.max_substance).ion_slots();
        if self.max_substance + ion_slots > self.grid.size() {
            return Err(format!(
                "grid {}x{} cannot hold {} substance molecules and {} A⁻ ions",
                self.grid.rows, self.grid.cols, self.max_substance, ion_slots
            ));
        }
        Ok(())
    }
}

/// Equations for `substance_count` molecules of a weak acid with the given
/// `Ka` dissociating as progress runs from 0 to 1.
#[derive(Clone, Debug, PartialEq)]
pub struct DissociationComponents {
    pub ka: f64,
    pub initial_concentration: f64,
    pub substance_count: usize,
    scale: MoleculeScale,
    ion_concentration: f64,
}

impl DissociationComponents {
    pub fn new(ka: f64, initial_concentration: f64, substance_count: usize) -> Self {
        Self {
            ka,
            initial_concentration,
            substance_count,
            scale: MoleculeScale::new(substance_count.max(1), initial_concentration),
            ion_concentration: weak_acid_ion_concentration(ka, initial_concentration),
        }
    }

    /// Equilibrium [H⁺] = [A⁻] reached at progress 1.
    pub fn ion_concentration(&self) -> f64 {
        self.ion_concentration
    }

    pub fn scale(&self) -> MoleculeScale {
        self.scale
    }

    /// Ion molecules (of each kind) implied at progress 1.
    pub fn final_ion_count(&self) -> f64 {
        if self.substance_count == 0 {
            return 0.0;
        }
        self.scale.count(self.ion_concentration)
    }

    /// Free cells the A⁻ ions need once dissociation completes.
    pub fn ion_slots(&self) -> usize {
        self.final_ion_count().ceil() as usize
    }

    pub fn substance_count_equation(&self) -> Equation {
        let n = self.substance_count as f64;
        Equation::linear(0.0, n, 1.0, n - self.final_ion_count())
    }

    /// Count of either ion; H⁺ and A⁻ form in pairs.
    pub fn ion_count_equation(&self) -> Equation {
        Equation::linear(0.0, 0.0, 1.0, self.final_ion_count())
    }

    pub fn substance_concentration_equation(&self) -> Equation {
        let c = self.initial_concentration;
        Equation::linear(0.0, c, 1.0, c - self.ion_concentration)
    }

    /// [H⁺], starting from pure water.
    pub fn primary_ion_concentration_equation(&self) -> Equation {
        Equation::linear(
            0.0,
            config::PURE_WATER_ION_CONCENTRATION,
            1.0,
            self.ion_concentration.max(config::PURE_WATER_ION_CONCENTRATION),
        )
    }

    pub fn secondary_ion_concentration_equation(&self) -> Equation {
        Equation::linear(0.0, 0.0, 1.0, self.ion_concentration)
    }

    pub fn ph_equation(&self) -> Equation {
        -Equation::log10(self.primary_ion_concentration_equation())
    }

    pub fn reaction() -> Reaction<AcidBaseMolecule> {
        Reaction::new(
            &[(AcidBaseMolecule::Substance, 1)],
            &[AcidBaseMolecule::PrimaryIon, AcidBaseMolecule::SecondaryIon],
        )
    }

    /// Progress model holding every substance molecule, nothing dissociated.
    pub fn initial_model(&self) -> ReactionProgressModel<AcidBaseMolecule> {
        let capacity = self.substance_count.max(config::DEFAULT_MAX_MOLECULES_PER_KIND);
        ReactionProgressModel::with_counts(capacity, &[(AcidBaseMolecule::Substance, self.substance_count)])
    }

    /// Dissociates molecules until the ion count matches `progress`.
    pub fn reconcile(&self, model: &mut ReactionProgressModel<AcidBaseMolecule>, progress: f64) -> usize {
        reconcile_reaction(
            model,
            &Self::reaction(),
            AcidBaseMolecule::PrimaryIon,
            &self.ion_count_equation(),
            progress,
        )
    }
}

/// Substance molecules are being added to the beaker.
#[derive(Clone, Debug)]
pub struct WeakSubstancePhase {
    pub settings: DissociationSettings,
    pub coords: LimitedGridCoords,
}

impl WeakSubstancePhase {
    pub fn new(settings: DissociationSettings) -> Self {
        let coords = LimitedGridCoords::new(
            settings.grid,
            Vec::new(),
            settings.min_substance,
            settings.max_substance,
            GrowthPattern::Random,
            settings.seed,
        );
        Self { settings, coords }
    }

    pub fn add_substance(&mut self, count: usize) -> usize {
        self.coords.add(count)
    }

    pub fn can_continue(&self) -> bool {
        self.coords.has_added_enough()
    }

    pub fn components(&self) -> DissociationComponents {
        DissociationComponents::new(
            self.settings.ka,
            self.settings.initial_concentration,
            self.coords.count(),
        )
    }
}

/// The added substance dissociates as progress moves from 0 to 1.
#[derive(Clone, Debug)]
pub struct DissociationPhase {
    pub previous: WeakSubstancePhase,
    pub components: DissociationComponents,
    pub model: ReactionProgressModel<AcidBaseMolecule>,
    secondary_coords: Vec<GridCoordinate>,
    progress: f64,
}

impl DissociationPhase {
    pub fn new(previous: &WeakSubstancePhase) -> Self {
        let components = previous.components();
        let ion_slots = components.ion_slots();
        let mut secondary = LimitedGridCoords::new(
            previous.settings.grid,
            previous.coords.coords().iter().copied(),
            0,
            ion_slots,
            GrowthPattern::Random,
            previous.settings.seed.wrapping_add(1),
        );
        secondary.add(ion_slots);
        info!(
            "dissociating {} substance molecules, expecting {:.2} ion pairs",
            components.substance_count,
            components.final_ion_count()
        );
        Self {
            previous: previous.clone(),
            model: components.initial_model(),
            components,
            secondary_coords: secondary.coords().to_vec(),
            progress: 0.0,
        }
    }

    pub fn progress(&self) -> f64 {
        self.progress
    }

    /// Moves progress forward (never back) and reconciles the model.
    pub fn set_progress(&mut self, progress: f64) -> usize {
        self.progress = self.progress.max(progress.clamp(0.0, 1.0));
        self.components.reconcile(&mut self.model, self.progress)
    }

    pub fn ph(&self) -> f64 {
        self.components.ph_equation().evaluate(self.progress)
    }

    /// Dissociated molecules leave their cell to an H⁺ and place the A⁻
    /// in a free cell, so no cell is ever shared.
    pub fn beaker(&self, progress: f64) -> BeakerSnapshot<AcidBaseMolecule> {
        let coords = self.previous.coords.coords();
        let remaining = self
            .components
            .substance_count_equation()
            .evaluate_count(progress)
            .min(coords.len());
        let dissociated = coords.len() - remaining;
        let mut beaker = BeakerSnapshot::new();
        beaker.insert(AcidBaseMolecule::Substance, &coords[..remaining]);
        beaker.insert(AcidBaseMolecule::PrimaryIon, &coords[remaining..]);
        beaker.insert(
            AcidBaseMolecule::SecondaryIon,
            &self.secondary_coords[..dissociated.min(self.secondary_coords.len())],
        );
        beaker
    }
}

#[derive(Clone, Debug)]
pub enum DissociationStep {
    AddingSubstance(WeakSubstancePhase),
    Dissociating(DissociationPhase),
}

/// The intro screen: add a weak acid, then watch it dissociate.
#[derive(Clone, Debug)]
pub struct DissociationExperiment {
    chain: PhaseChain<DissociationStep>,
}

impl DissociationExperiment {
    pub fn new(settings: DissociationSettings) -> Self {
        Self {
            chain: PhaseChain::new(DissociationStep::AddingSubstance(WeakSubstancePhase::new(settings))),
        }
    }

    pub fn step(&self) -> &DissociationStep {
        self.chain.current()
    }

    /// Adds substance while still in the adding phase; otherwise a no-op.
    pub fn add_substance(&mut self, count: usize) -> usize {
        match self.chain.current_mut() {
            DissociationStep::AddingSubstance(phase) => phase.add_substance(count),
            DissociationStep::Dissociating(_) => 0,
        }
    }

    /// Starts dissociation once enough substance was added.
    pub fn start_dissociation(&mut self) -> bool {
        let next = match self.chain.current() {
            DissociationStep::AddingSubstance(phase) if phase.can_continue() => DissociationPhase::new(phase),
            _ => return false,
        };
        self.chain.advance(DissociationStep::Dissociating(next));
        true
    }

    pub fn set_progress(&mut self, progress: f64) -> usize {
        match self.chain.current_mut() {
            DissociationStep::Dissociating(phase) => phase.set_progress(progress),
            DissociationStep::AddingSubstance(_) => 0,
        }
    }

    pub fn dissociation(&self) -> Option<&DissociationPhase> {
        match self.chain.current() {
            DissociationStep::Dissociating(phase) => Some(phase),
            DissociationStep::AddingSubstance(_) => None,
        }
    }

    pub fn can_go_back(&self) -> bool {
        self.chain.can_go_back()
    }

    pub fn back(&mut self) -> &DissociationStep {
        self.chain.back()
    }
}
