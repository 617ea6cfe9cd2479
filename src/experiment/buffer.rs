// experiment/buffer.rs
// Buffer screen: weak substance, then its salt, then a strong substance overwhelming the buffer

use log::info;
use serde::{Deserialize, Serialize};

use super::dissociation::{DissociationPhase, DissociationSettings, WeakSubstancePhase};
use crate::chemistry::{pka, weak_acid_ion_concentration, MoleculeScale};
use crate::config;
use crate::equation::Equation;
use crate::molecule::AcidBaseMolecule;
use crate::phase::PhaseChain;
use crate::reaction::{reconcile_additions, reconcile_reaction, Reaction, ReactionProgressModel};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BufferSettings {
    pub substance: DissociationSettings,
    pub max_salt: usize,
    pub max_strong: usize,
}

impl Default for BufferSettings {
    fn default() -> Self {
        Self {
            substance: DissociationSettings::default(),
            max_salt: 40,
            max_strong: 80,
        }
    }
}

impl BufferSettings {
    pub fn validate(&self) -> Result<(), String> {
        self.substance.validate()?;
        if self.max_salt == 0 {
            return Err("buffer needs room for at least one salt molecule".to_string());
        }
        Ok(())
    }
}

/// Salt (A⁻) is added to the equilibrated weak substance. Each salt
/// molecule pulls the equilibrium back, recombining H⁺ and A⁻ into HA.
#[derive(Clone, Debug)]
pub struct SaltPhase {
    pub previous: DissociationPhase,
    pub model: ReactionProgressModel<AcidBaseMolecule>,
    scale: MoleculeScale,
    max_salt: usize,
    salt_added: usize,
}

impl SaltPhase {
    pub fn new(previous: &DissociationPhase, max_salt: usize) -> Self {
        Self {
            previous: previous.clone(),
            model: previous.model.copy(),
            scale: previous.components.scale(),
            max_salt,
            salt_added: 0,
        }
    }

    pub fn salt_added(&self) -> usize {
        self.salt_added
    }

    pub fn can_add_salt(&self) -> bool {
        self.salt_added < self.max_salt
    }

    fn ion_concentration(&self) -> f64 {
        self.previous.components.ion_concentration()
    }

    fn ka(&self) -> f64 {
        self.previous.components.ka
    }

    /// [A⁻] against salt molecules added.
    pub fn secondary_ion_concentration_equation(&self) -> Equation {
        let x0 = self.ion_concentration();
        Equation::linear(0.0, x0, 1.0, x0 + self.scale.molarity_per_molecule)
    }

    pub fn substance_concentration_equation(&self) -> Equation {
        let c = self.previous.components.initial_concentration;
        Equation::constant(c - self.ion_concentration())
    }

    /// [H⁺] = Ka·[HA] / [A⁻].
    pub fn primary_ion_concentration_equation(&self) -> Equation {
        (self.substance_concentration_equation() * self.ka()) / self.secondary_ion_concentration_equation()
    }

    pub fn ph_equation(&self) -> Equation {
        -Equation::log10(self.primary_ion_concentration_equation())
    }

    /// HA molecules: every H⁺ that left the solution recombined with an A⁻.
    pub fn substance_count_equation(&self) -> Equation {
        let n = self.previous.components.substance_count as f64;
        let primary_count = self.primary_ion_concentration_equation() * (1.0 / self.scale.molarity_per_molecule);
        Equation::constant(n) - primary_count
    }

    pub fn recombination() -> Reaction<AcidBaseMolecule> {
        Reaction::new(
            &[(AcidBaseMolecule::PrimaryIon, 1), (AcidBaseMolecule::SecondaryIon, 1)],
            &[AcidBaseMolecule::Substance],
        )
    }

    /// Adds up to `count` salt molecules and lets the equilibrium respond.
    pub fn add_salt(&mut self, count: usize) -> usize {
        let count = count.min(self.max_salt - self.salt_added);
        let added = self.model.add_molecules(
            AcidBaseMolecule::SecondaryIon,
            count,
            config::MOLECULE_APPEAR_DURATION,
            usize::MAX,
        );
        self.salt_added += added;
        let target = self.substance_count_equation();
        reconcile_reaction(
            &mut self.model,
            &Self::recombination(),
            AcidBaseMolecule::Substance,
            &target,
            self.salt_added as f64,
        );
        added
    }

    pub fn ph(&self) -> f64 {
        self.ph_equation().evaluate(self.salt_added as f64)
    }
}

/// A strong acid is added. Its H⁺ converts A⁻ into HA until the salt is
/// used up, after which the excess H⁺ stays in solution.
#[derive(Clone, Debug)]
pub struct StrongSubstancePhase {
    pub previous: SaltPhase,
    pub model: ReactionProgressModel<AcidBaseMolecule>,
    scale: MoleculeScale,
    ka: f64,
    initial_salt: usize,
    initial_substance: usize,
    initial_primary: usize,
    max_strong: usize,
    strong_added: usize,
}

impl StrongSubstancePhase {
    pub fn new(previous: &SaltPhase, max_strong: usize) -> Self {
        let model = previous.model.copy();
        let initial_salt = model.molecule_counts(AcidBaseMolecule::SecondaryIon);
        let initial_substance = model.molecule_counts(AcidBaseMolecule::Substance);
        let initial_primary = model.molecule_counts(AcidBaseMolecule::PrimaryIon);
        info!(
            "buffer holds {} A⁻ against {} HA before strong substance",
            initial_salt, initial_substance
        );
        Self {
            previous: previous.clone(),
            model,
            scale: previous.scale,
            ka: previous.ka(),
            initial_salt,
            initial_substance,
            initial_primary,
            max_strong,
            strong_added: 0,
        }
    }

    pub fn strong_added(&self) -> usize {
        self.strong_added
    }

    /// Strong substance molecules needed to use up every A⁻.
    pub fn exhaustion_point(&self) -> f64 {
        self.initial_salt as f64
    }

    pub fn substance_count_equation(&self) -> Equation {
        let s0 = self.initial_substance as f64;
        Equation::linear(0.0, s0, 1.0, s0 + 1.0).within(s0, s0 + self.initial_salt as f64)
    }

    pub fn primary_ion_count_equation(&self) -> Equation {
        let h0 = self.initial_primary as f64;
        let end = self.exhaustion_point();
        Equation::switching(
            end,
            Equation::constant(h0),
            Equation::linear(end, h0, end + 1.0, h0 + 1.0),
        )
    }

    /// pH of the spent buffer: the weak substance alone, with all the salt converted.
    fn exhausted_ph(&self) -> f64 {
        let total = self.scale.concentration((self.initial_substance + self.initial_salt) as f64);
        -weak_acid_ion_concentration(self.ka, total).log10()
    }

    /// Henderson–Hasselbalch while A⁻ remains, then the excess strong
    /// substance on top of the weak equilibrium.
    pub fn ph_equation(&self) -> Equation {
        let m = self.scale.molarity_per_molecule;
        let a0 = self.scale.concentration(self.initial_salt as f64);
        let ha0 = self.scale.concentration(self.initial_substance as f64);
        let end = self.exhaustion_point();
        let floor = self.exhausted_ph().clamp(0.0, config::PH_SCALE);

        let salt = Equation::linear(0.0, a0, 1.0, a0 - m);
        let substance = Equation::linear(0.0, ha0, 1.0, ha0 + m);
        let buffered = (Equation::log10(salt / substance) + pka(self.ka)).within(floor, config::PH_SCALE);

        let total = self.scale.concentration((self.initial_substance + self.initial_salt) as f64);
        let weak = weak_acid_ion_concentration(self.ka, total);
        let excess = Equation::linear(end, weak, end + 1.0, weak + m);
        let overwhelmed = -Equation::log10(excess);

        Equation::switching(end, buffered, overwhelmed).within(0.0, config::PH_SCALE)
    }

    pub fn conversion() -> Reaction<AcidBaseMolecule> {
        Reaction::new(&[(AcidBaseMolecule::SecondaryIon, 1)], &[AcidBaseMolecule::Substance])
    }

    pub fn add_strong(&mut self, count: usize) -> usize {
        let count = count.min(self.max_strong - self.strong_added);
        self.strong_added += count;
        let t = self.strong_added as f64;
        let substance = self.substance_count_equation();
        let primary = self.primary_ion_count_equation();
        reconcile_reaction(
            &mut self.model,
            &Self::conversion(),
            AcidBaseMolecule::Substance,
            &substance,
            t,
        );
        reconcile_additions(&mut self.model, AcidBaseMolecule::PrimaryIon, &primary, t);
        count
    }

    pub fn ph(&self) -> f64 {
        self.ph_equation().evaluate(self.strong_added as f64)
    }
}

#[derive(Clone, Debug)]
pub enum BufferStep {
    WeakSubstance(WeakSubstancePhase),
    Salt(SaltPhase),
    StrongSubstance(StrongSubstancePhase),
}

#[derive(Clone, Debug)]
pub struct BufferExperiment {
    settings: BufferSettings,
    chain: PhaseChain<BufferStep>,
}

impl BufferExperiment {
    pub fn new(settings: BufferSettings) -> Self {
        let first = BufferStep::WeakSubstance(WeakSubstancePhase::new(settings.substance.clone()));
        Self {
            settings,
            chain: PhaseChain::new(first),
        }
    }

    pub fn step(&self) -> &BufferStep {
        self.chain.current()
    }

    pub fn add_substance(&mut self, count: usize) -> usize {
        match self.chain.current_mut() {
            BufferStep::WeakSubstance(phase) => phase.add_substance(count),
            _ => 0,
        }
    }

    /// Lets the weak substance reach equilibrium and moves on to adding salt.
    pub fn start_salt(&mut self) -> bool {
        let next = match self.chain.current() {
            BufferStep::WeakSubstance(phase) if phase.can_continue() => {
                let mut equilibrium = DissociationPhase::new(phase);
                equilibrium.set_progress(1.0);
                SaltPhase::new(&equilibrium, self.settings.max_salt)
            }
            _ => return false,
        };
        self.chain.advance(BufferStep::Salt(next));
        true
    }

    pub fn add_salt(&mut self, count: usize) -> usize {
        match self.chain.current_mut() {
            BufferStep::Salt(phase) => phase.add_salt(count),
            _ => 0,
        }
    }

    pub fn start_strong(&mut self) -> bool {
        let next = match self.chain.current() {
            BufferStep::Salt(phase) if phase.salt_added() > 0 => {
                StrongSubstancePhase::new(phase, self.settings.max_strong)
            }
            _ => return false,
        };
        self.chain.advance(BufferStep::StrongSubstance(next));
        true
    }

    pub fn add_strong(&mut self, count: usize) -> usize {
        match self.chain.current_mut() {
            BufferStep::StrongSubstance(phase) => phase.add_strong(count),
            _ => 0,
        }
    }

    pub fn model(&self) -> Option<&ReactionProgressModel<AcidBaseMolecule>> {
        match self.chain.current() {
            BufferStep::WeakSubstance(_) => None,
            BufferStep::Salt(phase) => Some(&phase.model),
            BufferStep::StrongSubstance(phase) => Some(&phase.model),
        }
    }

    pub fn ph(&self) -> Option<f64> {
        match self.chain.current() {
            BufferStep::WeakSubstance(_) => None,
            BufferStep::Salt(phase) => Some(phase.ph()),
            BufferStep::StrongSubstance(phase) => Some(phase.ph()),
        }
    }

    pub fn can_go_back(&self) -> bool {
        self.chain.can_go_back()
    }

    pub fn back(&mut self) -> &BufferStep {
        self.chain.back()
    }
}
