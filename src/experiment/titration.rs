// experiment/titration.rs
// Titration of a weak acid with a strong base: preparation, pre-equivalence, post-equivalence

use log::info;
use serde::{Deserialize, Serialize};

use crate::chemistry::{kb_from_ka, pka, weak_acid_ion_concentration, MoleculeScale};
use crate::config;
use crate::equation::{Equation, Series};
use crate::grid::{Grid, GrowthPattern, LimitedGridCoords};
use crate::molecule::TitrationMolecule;
use crate::phase::PhaseChain;
use crate::reaction::{reconcile_additions, reconcile_reaction, Reaction, ReactionProgressModel};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TitrationSettings {
    pub ka: f64,
    pub initial_concentration: f64,
    pub grid: Grid,
    pub min_substance: usize,
    pub max_substance: usize,
    /// Titrant molecules that may be added past the equivalence point.
    pub max_excess_titrant: usize,
    pub seed: u64,
}

impl Default for TitrationSettings {
    fn default() -> Self {
        Self {
            ka: 1.8e-5,
            initial_concentration: 0.1,
            grid: Grid::new(config::DEFAULT_GRID_ROWS, config::DEFAULT_GRID_COLS),
            min_substance: 10,
            max_substance: 50,
            max_excess_titrant: 30,
            seed: config::DEFAULT_SEED,
        }
    }
}

impl TitrationSettings {
    pub fn validate(&self) -> Result<(), String> {
        let positive = |v: f64| v.is_finite() && v > 0.0;
        if !(positive(self.ka) && positive(self.initial_concentration)) {
            return Err(format!(
                "titration needs positive Ka and concentration, got {} and {}",
                self.ka, self.initial_concentration
            ));
        }
        if self.min_substance == 0 || self.min_substance > self.max_substance {
            return Err(format!(
                "invalid substance bounds [{}, {}]",
                self.min_substance, self.max_substance
            ));
        }
        if self.min_substance > self.grid.size() {
            return Err(format!(
                "grid of {} cells cannot hold {} substance molecules",
                self.grid.size(),
                self.min_substance
            ));
        }
        Ok(())
    }
}

/// pH equations of a titration, with titrant molecules added as input.
/// The equivalence point sits at `substance_count` molecules.
#[derive(Clone, Debug, PartialEq)]
pub struct TitrationComponents {
    pub ka: f64,
    pub initial_concentration: f64,
    pub substance_count: usize,
    scale: MoleculeScale,
    initial_ion_concentration: f64,
    equivalence_hydroxide: f64,
}

impl TitrationComponents {
    pub fn new(ka: f64, initial_concentration: f64, substance_count: usize) -> Self {
        assert!(substance_count > 0, "titration needs at least one substance molecule");
        Self {
            ka,
            initial_concentration,
            substance_count,
            scale: MoleculeScale::new(substance_count, initial_concentration),
            initial_ion_concentration: weak_acid_ion_concentration(ka, initial_concentration),
            equivalence_hydroxide: weak_acid_ion_concentration(kb_from_ka(ka), initial_concentration)
                + config::PURE_WATER_ION_CONCENTRATION,
        }
    }

    pub fn equivalence_point(&self) -> f64 {
        self.substance_count as f64
    }

    /// pH before any titrant, with water's own H⁺ on top of the acid's.
    pub fn initial_ph(&self) -> f64 {
        -(self.initial_ion_concentration + config::PURE_WATER_ION_CONCENTRATION).log10()
    }

    /// pH of the pure salt solution, from A⁻ hydrolysis.
    pub fn equivalence_ph(&self) -> f64 {
        config::PH_SCALE + self.equivalence_hydroxide.log10()
    }

    /// Buffer region: Henderson–Hasselbalch as titrant turns HA into A⁻.
    pub fn pre_equivalence_ph(&self) -> Equation {
        let c = self.initial_concentration;
        let x0 = self.initial_ion_concentration;
        let ep = self.equivalence_point();
        let salt = Equation::linear(0.0, x0, ep, c);
        let substance = Equation::linear(0.0, c - x0, ep, 0.0);
        // water keeps the start at or below pH 7 and equivalence at or above it
        let low = self.initial_ph().min(self.equivalence_ph());
        let high = self.initial_ph().max(self.equivalence_ph());
        (Equation::log10(salt / substance) + pka(self.ka)).within(low, high)
    }

    /// Excess hydroxide on top of the hydrolysed salt.
    pub fn post_equivalence_ph(&self) -> Equation {
        let ep = self.equivalence_point();
        let oh = self.equivalence_hydroxide;
        let hydroxide = Equation::linear(ep, oh, ep + 1.0, oh + self.scale.molarity_per_molecule);
        (Equation::log10(hydroxide) + config::PH_SCALE).within(0.0, config::PH_SCALE)
    }

    pub fn ph_curve(&self) -> Equation {
        Equation::switching(
            self.equivalence_point(),
            self.pre_equivalence_ph(),
            self.post_equivalence_ph(),
        )
    }

    /// Samples the whole curve up to `max_excess` titrant past equivalence.
    pub fn sample_curve(&self, max_excess: usize, points: usize) -> Series {
        self.ph_curve()
            .sample(0.0, self.equivalence_point() + max_excess as f64, points)
    }

    pub fn salt_count_equation(&self) -> Equation {
        Equation::linear(0.0, 0.0, 1.0, 1.0).within(0.0, self.equivalence_point())
    }

    pub fn excess_titrant_count_equation(&self) -> Equation {
        let ep = self.equivalence_point();
        Equation::linear(ep, 0.0, ep + 1.0, 1.0)
    }

    pub fn neutralization() -> Reaction<TitrationMolecule> {
        Reaction::new(&[(TitrationMolecule::Substance, 1)], &[TitrationMolecule::SecondaryIon])
    }
}

#[derive(Clone, Debug)]
pub struct PreparationPhase {
    pub settings: TitrationSettings,
    pub coords: LimitedGridCoords,
}

impl PreparationPhase {
    pub fn new(settings: TitrationSettings) -> Self {
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
}

#[derive(Clone, Debug)]
pub struct PreEquivalencePhase {
    pub previous: PreparationPhase,
    pub components: TitrationComponents,
    pub model: ReactionProgressModel<TitrationMolecule>,
    pub titrant_added: usize,
}

impl PreEquivalencePhase {
    pub fn new(previous: &PreparationPhase) -> Self {
        let n = previous.coords.count();
        let components = TitrationComponents::new(
            previous.settings.ka,
            previous.settings.initial_concentration,
            n,
        );
        info!(
            "titrating {} substance molecules, equivalence pH {:.2}",
            n,
            components.equivalence_ph()
        );
        let capacity = (n + previous.settings.max_excess_titrant).max(config::DEFAULT_MAX_MOLECULES_PER_KIND);
        Self {
            previous: previous.clone(),
            model: ReactionProgressModel::with_counts(capacity, &[(TitrationMolecule::Substance, n)]),
            components,
            titrant_added: 0,
        }
    }

    /// Titrant is clamped at the equivalence point within this phase.
    pub fn add_titrant(&mut self, count: usize) -> usize {
        let count = count.min(self.components.substance_count - self.titrant_added);
        self.titrant_added += count;
        reconcile_reaction(
            &mut self.model,
            &TitrationComponents::neutralization(),
            TitrationMolecule::SecondaryIon,
            &self.components.salt_count_equation(),
            self.titrant_added as f64,
        );
        count
    }

    pub fn at_equivalence(&self) -> bool {
        self.titrant_added == self.components.substance_count
    }

    pub fn ph(&self) -> f64 {
        self.components.ph_curve().evaluate(self.titrant_added as f64)
    }
}

#[derive(Clone, Debug)]
pub struct PostEquivalencePhase {
    pub previous: PreEquivalencePhase,
    pub model: ReactionProgressModel<TitrationMolecule>,
    pub titrant_added: usize,
    max_titrant: usize,
}

impl PostEquivalencePhase {
    pub fn new(previous: &PreEquivalencePhase) -> Self {
        Self {
            previous: previous.clone(),
            model: previous.model.copy(),
            titrant_added: previous.titrant_added,
            max_titrant: previous.components.substance_count + previous.previous.settings.max_excess_titrant,
        }
    }

    pub fn components(&self) -> &TitrationComponents {
        &self.previous.components
    }

    pub fn add_titrant(&mut self, count: usize) -> usize {
        let count = count.min(self.max_titrant - self.titrant_added);
        self.titrant_added += count;
        reconcile_additions(
            &mut self.model,
            TitrationMolecule::Titrant,
            &self.previous.components.excess_titrant_count_equation(),
            self.titrant_added as f64,
        );
        count
    }

    pub fn ph(&self) -> f64 {
        self.components().ph_curve().evaluate(self.titrant_added as f64)
    }
}

#[derive(Clone, Debug)]
pub enum TitrationPhase {
    Preparation(PreparationPhase),
    PreEquivalence(PreEquivalencePhase),
    PostEquivalence(PostEquivalencePhase),
}

#[derive(Clone, Debug)]
pub struct TitrationExperiment {
    chain: PhaseChain<TitrationPhase>,
}

impl TitrationExperiment {
    pub fn new(settings: TitrationSettings) -> Self {
        Self {
            chain: PhaseChain::new(TitrationPhase::Preparation(PreparationPhase::new(settings))),
        }
    }

    pub fn phase(&self) -> &TitrationPhase {
        self.chain.current()
    }

    pub fn add_substance(&mut self, count: usize) -> usize {
        match self.chain.current_mut() {
            TitrationPhase::Preparation(phase) => phase.coords.add(count),
            _ => 0,
        }
    }

    pub fn start_titration(&mut self) -> bool {
        let next = match self.chain.current() {
            TitrationPhase::Preparation(phase) if phase.coords.has_added_enough() => {
                PreEquivalencePhase::new(phase)
            }
            _ => return false,
        };
        self.chain.advance(TitrationPhase::PreEquivalence(next));
        true
    }

    /// Adds titrant in the current phase. Moving past the equivalence
    /// point needs an explicit [`TitrationExperiment::pass_equivalence`].
    pub fn add_titrant(&mut self, count: usize) -> usize {
        match self.chain.current_mut() {
            TitrationPhase::Preparation(_) => 0,
            TitrationPhase::PreEquivalence(phase) => phase.add_titrant(count),
            TitrationPhase::PostEquivalence(phase) => phase.add_titrant(count),
        }
    }

    pub fn pass_equivalence(&mut self) -> bool {
        let next = match self.chain.current() {
            TitrationPhase::PreEquivalence(phase) if phase.at_equivalence() => PostEquivalencePhase::new(phase),
            _ => return false,
        };
        self.chain.advance(TitrationPhase::PostEquivalence(next));
        true
    }

    pub fn components(&self) -> Option<&TitrationComponents> {
        match self.chain.current() {
            TitrationPhase::Preparation(_) => None,
            TitrationPhase::PreEquivalence(phase) => Some(&phase.components),
            TitrationPhase::PostEquivalence(phase) => Some(phase.components()),
        }
    }

    pub fn model(&self) -> Option<&ReactionProgressModel<TitrationMolecule>> {
        match self.chain.current() {
            TitrationPhase::Preparation(_) => None,
            TitrationPhase::PreEquivalence(phase) => Some(&phase.model),
            TitrationPhase::PostEquivalence(phase) => Some(&phase.model),
        }
    }

    pub fn ph(&self) -> Option<f64> {
        match self.chain.current() {
            TitrationPhase::Preparation(_) => None,
            TitrationPhase::PreEquivalence(phase) => Some(phase.ph()),
            TitrationPhase::PostEquivalence(phase) => Some(phase.ph()),
        }
    }

    pub fn can_go_back(&self) -> bool {
        self.chain.can_go_back()
    }

    pub fn back(&mut self) -> &TitrationPhase {
        self.chain.back()
    }
}
