// experiment/precipitation.rs
// Precipitation screen: two reactants form a precipitate, revealing the unknown reactant's molar mass

use log::{debug, info};
use serde::{Deserialize, Serialize};

use super::BeakerSnapshot;
use crate::config;
use crate::equation::Equation;
use crate::grid::{FractionedCoordinates, Grid, GridCoordinate, GrowthPattern, LimitedGridCoords};
use crate::molecule::PrecipitationMolecule;
use crate::phase::PhaseChain;
use crate::reaction::{reconcile_reaction, Reaction, ReactionProgressModel};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrecipitationSettings {
    pub grid: Grid,
    /// Separate grid the precipitate settles on.
    pub precipitate_grid: Grid,
    pub min_known: usize,
    pub max_known: usize,
    pub min_unknown: usize,
    pub max_unknown: usize,
    pub max_extra: usize,
    /// Moles represented by a single molecule on the grid.
    pub moles_per_molecule: f64,
    /// Molar mass of the unknown reactant; only revealed through the precipitate.
    pub unknown_molar_mass: f64,
    pub product_molar_mass: f64,
    pub seed: u64,
}

impl Default for PrecipitationSettings {
    fn default() -> Self {
        Self {
            grid: Grid::new(config::DEFAULT_GRID_ROWS, config::DEFAULT_GRID_COLS),
            precipitate_grid: Grid::new(7, 7),
            min_known: 10,
            max_known: 40,
            min_unknown: 10,
            max_unknown: 40,
            max_extra: 30,
            moles_per_molecule: 0.005,
            unknown_molar_mass: 208.23,
            product_molar_mass: 233.38,
            seed: config::DEFAULT_SEED,
        }
    }
}

impl PrecipitationSettings {
    pub fn validate(&self) -> Result<(), String> {
        if self.grid.size() == 0 || self.precipitate_grid.size() == 0 {
            return Err("precipitation grids must not be empty".to_string());
        }
        if self.min_known > self.max_known || self.min_unknown > self.max_unknown {
            return Err("reactant minimums must not exceed their maximums".to_string());
        }
        if self.min_known + self.min_unknown > self.grid.size() {
            return Err(format!(
                "grid of {} cells cannot hold {} + {} reactant molecules",
                self.grid.size(),
                self.min_known,
                self.min_unknown
            ));
        }
        // every unknown molecule can end up as precipitate, given enough extra known
        let most_product = self.max_unknown.min(self.grid.size());
        if most_product > self.precipitate_grid.size() {
            return Err(format!(
                "precipitate grid of {} cells cannot hold {} product molecules",
                self.precipitate_grid.size(),
                most_product
            ));
        }
        if !(self.moles_per_molecule > 0.0 && self.unknown_molar_mass > 0.0 && self.product_molar_mass > 0.0) {
            return Err("moles per molecule and molar masses must be positive".to_string());
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LimitingReactant {
    Known,
    Unknown,
    /// Both reactants run out together.
    Neither,
}

pub fn limiting_reactant(known: usize, unknown: usize) -> LimitingReactant {
    match known.cmp(&unknown) {
        std::cmp::Ordering::Less => LimitingReactant::Known,
        std::cmp::Ordering::Greater => LimitingReactant::Unknown,
        std::cmp::Ordering::Equal => LimitingReactant::Neither,
    }
}

fn precipitation_reaction() -> Reaction<PrecipitationMolecule> {
    Reaction::new(
        &[
            (PrecipitationMolecule::KnownReactant, 1),
            (PrecipitationMolecule::UnknownReactant, 1),
        ],
        &[PrecipitationMolecule::Product],
    )
}

/// Fraction of `total` coordinates still drawn once `consumed` have reacted.
fn shrinking(total: usize, consumed: usize) -> Equation {
    if total == 0 {
        return Equation::constant(0.0);
    }
    Equation::linear(0.0, 1.0, 1.0, (total - consumed) as f64 / total as f64)
}

#[derive(Clone, Debug)]
pub struct KnownReactantPhase {
    pub settings: PrecipitationSettings,
    pub known: LimitedGridCoords,
}

impl KnownReactantPhase {
    pub fn new(settings: PrecipitationSettings) -> Self {
        let known = LimitedGridCoords::new(
            settings.grid,
            Vec::new(),
            settings.min_known,
            settings.max_known,
            GrowthPattern::Random,
            settings.seed,
        );
        Self { settings, known }
    }
}

#[derive(Clone, Debug)]
pub struct UnknownReactantPhase {
    pub previous: KnownReactantPhase,
    pub unknown: LimitedGridCoords,
}

impl UnknownReactantPhase {
    pub fn new(previous: &KnownReactantPhase) -> Self {
        let settings = &previous.settings;
        let unknown = LimitedGridCoords::new(
            settings.grid,
            previous.known.coords().iter().copied(),
            settings.min_unknown,
            settings.max_unknown,
            GrowthPattern::Random,
            settings.seed.wrapping_add(1),
        );
        Self {
            previous: previous.clone(),
            unknown,
        }
    }

    pub fn settings(&self) -> &PrecipitationSettings {
        &self.previous.settings
    }

    pub fn unknown_mass(&self) -> f64 {
        let settings = self.settings();
        self.unknown.count() as f64 * settings.moles_per_molecule * settings.unknown_molar_mass
    }
}

/// Reactants combine as progress runs from 0 to 1; the precipitate grows
/// from the centre of its own grid.
#[derive(Clone, Debug)]
pub struct ReactPhase {
    pub previous: UnknownReactantPhase,
    pub model: ReactionProgressModel<PrecipitationMolecule>,
    pub known: FractionedCoordinates,
    pub unknown: FractionedCoordinates,
    pub precipitate: FractionedCoordinates,
    precipitate_coords: LimitedGridCoords,
    units: usize,
    progress: f64,
}

impl ReactPhase {
    pub fn new(previous: &UnknownReactantPhase) -> Self {
        let settings = previous.settings();
        let a = previous.previous.known.count();
        let b = previous.unknown.count();
        let units = a.min(b);
        info!("reacting {} known with {} unknown: {} units", a, b, units);

        let mut precipitate_coords = LimitedGridCoords::new(
            settings.precipitate_grid,
            Vec::new(),
            0,
            settings.precipitate_grid.size(),
            GrowthPattern::Spiral,
            settings.seed,
        );
        precipitate_coords.add(units);

        let capacity = (a + b + settings.max_extra).max(config::DEFAULT_MAX_MOLECULES_PER_KIND);
        Self {
            previous: previous.clone(),
            model: ReactionProgressModel::with_counts(
                capacity,
                &[
                    (PrecipitationMolecule::KnownReactant, a),
                    (PrecipitationMolecule::UnknownReactant, b),
                ],
            ),
            known: previous.previous.known.fractioned(shrinking(a, units)),
            unknown: previous.unknown.fractioned(shrinking(b, units)),
            precipitate: precipitate_coords.fractioned(Equation::linear(0.0, 0.0, 1.0, 1.0)),
            precipitate_coords,
            units,
            progress: 0.0,
        }
    }

    pub fn settings(&self) -> &PrecipitationSettings {
        self.previous.settings()
    }

    pub fn units(&self) -> usize {
        self.units
    }

    pub fn limiting_reactant(&self) -> LimitingReactant {
        limiting_reactant(self.previous.previous.known.count(), self.previous.unknown.count())
    }

    pub fn product_count_equation(&self) -> Equation {
        Equation::linear(0.0, 0.0, 1.0, self.units as f64)
    }

    pub fn set_progress(&mut self, progress: f64) -> usize {
        self.progress = self.progress.max(progress.clamp(0.0, 1.0));
        let target = self.product_count_equation();
        reconcile_reaction(
            &mut self.model,
            &precipitation_reaction(),
            PrecipitationMolecule::Product,
            &target,
            self.progress,
        )
    }

    pub fn progress(&self) -> f64 {
        self.progress
    }

    pub fn beaker(&self, progress: f64) -> BeakerSnapshot<PrecipitationMolecule> {
        let mut beaker = BeakerSnapshot::new();
        beaker.insert(PrecipitationMolecule::KnownReactant, self.known.coords_at(progress));
        beaker.insert(PrecipitationMolecule::UnknownReactant, self.unknown.coords_at(progress));
        beaker
    }

    pub fn precipitate_at(&self, progress: f64) -> &[GridCoordinate] {
        self.precipitate.coords_at(progress)
    }
}

/// More known reactant is added so the leftover unknown can react.
#[derive(Clone, Debug)]
pub struct ExtraReactantPhase {
    pub previous: ReactPhase,
    pub model: ReactionProgressModel<PrecipitationMolecule>,
    pub extra: LimitedGridCoords,
}

impl ExtraReactantPhase {
    pub fn new(previous: &ReactPhase) -> Self {
        let settings = previous.settings();
        let occupied: Vec<GridCoordinate> = previous
            .known
            .coords_at(1.0)
            .iter()
            .chain(previous.unknown.coords_at(1.0))
            .copied()
            .collect();
        let leftover = previous.model.molecule_counts(PrecipitationMolecule::UnknownReactant);
        let free = settings.grid.size() - occupied.len();
        let extra = LimitedGridCoords::new(
            settings.grid,
            occupied,
            leftover.min(free),
            settings.max_extra.max(leftover).min(free),
            GrowthPattern::Random,
            settings.seed.wrapping_add(2),
        );
        Self {
            previous: previous.clone(),
            model: previous.model.copy(),
            extra,
        }
    }

    pub fn add_known(&mut self, count: usize) -> usize {
        let added = self.extra.add(count);
        let in_model = self.model.add_molecules(
            PrecipitationMolecule::KnownReactant,
            added,
            config::MOLECULE_APPEAR_DURATION,
            usize::MAX,
        );
        if in_model < added {
            debug!("progress model took {} of {} extra molecules", in_model, added);
        }
        added
    }

    pub fn has_added_enough(&self) -> bool {
        self.extra.has_added_enough()
    }
}

#[derive(Clone, Debug)]
pub struct FinalReactPhase {
    pub previous: ExtraReactantPhase,
    pub model: ReactionProgressModel<PrecipitationMolecule>,
    pub known: FractionedCoordinates,
    pub unknown: FractionedCoordinates,
    pub precipitate: FractionedCoordinates,
    units: usize,
    progress: f64,
}

impl FinalReactPhase {
    pub fn new(previous: &ExtraReactantPhase) -> Self {
        let react = &previous.previous;
        let model = previous.model.copy();
        let known_left = model.molecule_counts(PrecipitationMolecule::KnownReactant);
        let unknown_left = model.molecule_counts(PrecipitationMolecule::UnknownReactant);
        let units = known_left.min(unknown_left);

        let known_coords: Vec<GridCoordinate> = react
            .known
            .coords_at(1.0)
            .iter()
            .chain(previous.extra.coords())
            .copied()
            .collect();
        let unknown_coords = react.unknown.coords_at(1.0).to_vec();

        let mut precipitate_coords = react.precipitate_coords.clone();
        let before = precipitate_coords.count();
        precipitate_coords.add(units);
        let after = precipitate_coords.count();
        let start = if after == 0 { 0.0 } else { before as f64 / after as f64 };

        Self {
            previous: previous.clone(),
            model,
            known: FractionedCoordinates::new(
                known_coords.clone(),
                shrinking(known_coords.len(), units.min(known_coords.len())),
            ),
            unknown: FractionedCoordinates::new(
                unknown_coords.clone(),
                shrinking(unknown_coords.len(), units.min(unknown_coords.len())),
            ),
            precipitate: precipitate_coords.fractioned(Equation::linear(0.0, start, 1.0, 1.0)),
            units,
            progress: 0.0,
        }
    }

    pub fn units(&self) -> usize {
        self.units
    }

    pub fn set_progress(&mut self, progress: f64) -> usize {
        self.progress = self.progress.max(progress.clamp(0.0, 1.0));
        let before = self.previous.model.molecule_counts(PrecipitationMolecule::Product) as f64;
        let target = Equation::linear(0.0, before, 1.0, before + self.units as f64);
        reconcile_reaction(
            &mut self.model,
            &precipitation_reaction(),
            PrecipitationMolecule::Product,
            &target,
            self.progress,
        )
    }

    pub fn beaker(&self, progress: f64) -> BeakerSnapshot<PrecipitationMolecule> {
        let mut beaker = BeakerSnapshot::new();
        beaker.insert(PrecipitationMolecule::KnownReactant, self.known.coords_at(progress));
        beaker.insert(PrecipitationMolecule::UnknownReactant, self.unknown.coords_at(progress));
        beaker
    }
}

#[derive(Clone, Debug)]
pub enum PrecipitationStep {
    KnownReactant(KnownReactantPhase),
    UnknownReactant(UnknownReactantPhase),
    React(ReactPhase),
    ExtraReactant(ExtraReactantPhase),
    FinalReact(FinalReactPhase),
}

#[derive(Clone, Debug)]
pub struct PrecipitationExperiment {
    chain: PhaseChain<PrecipitationStep>,
}

impl PrecipitationExperiment {
    pub fn new(settings: PrecipitationSettings) -> Self {
        Self {
            chain: PhaseChain::new(PrecipitationStep::KnownReactant(KnownReactantPhase::new(settings))),
        }
    }

    pub fn step(&self) -> &PrecipitationStep {
        self.chain.current()
    }

    /// Adds reactant of whichever kind the current phase accepts.
    pub fn add_reactant(&mut self, count: usize) -> usize {
        match self.chain.current_mut() {
            PrecipitationStep::KnownReactant(phase) => phase.known.add(count),
            PrecipitationStep::UnknownReactant(phase) => phase.unknown.add(count),
            PrecipitationStep::ExtraReactant(phase) => phase.add_known(count),
            PrecipitationStep::React(_) | PrecipitationStep::FinalReact(_) => 0,
        }
    }

    /// Moves to the next phase when the current one allows it.
    pub fn next(&mut self) -> bool {
        let next = match self.chain.current() {
            PrecipitationStep::KnownReactant(phase) if phase.known.has_added_enough() => {
                PrecipitationStep::UnknownReactant(UnknownReactantPhase::new(phase))
            }
            PrecipitationStep::UnknownReactant(phase) if phase.unknown.has_added_enough() => {
                PrecipitationStep::React(ReactPhase::new(phase))
            }
            PrecipitationStep::React(phase)
                if phase.progress() >= 1.0
                    && phase.model.molecule_counts(PrecipitationMolecule::UnknownReactant) > 0 =>
            {
                PrecipitationStep::ExtraReactant(ExtraReactantPhase::new(phase))
            }
            PrecipitationStep::ExtraReactant(phase) if phase.has_added_enough() => {
                PrecipitationStep::FinalReact(FinalReactPhase::new(phase))
            }
            _ => return false,
        };
        self.chain.advance(next);
        true
    }

    pub fn set_progress(&mut self, progress: f64) -> usize {
        match self.chain.current_mut() {
            PrecipitationStep::React(phase) => phase.set_progress(progress),
            PrecipitationStep::FinalReact(phase) => phase.set_progress(progress),
            _ => 0,
        }
    }

    pub fn model(&self) -> Option<&ReactionProgressModel<PrecipitationMolecule>> {
        match self.chain.current() {
            PrecipitationStep::React(phase) => Some(&phase.model),
            PrecipitationStep::ExtraReactant(phase) => Some(&phase.model),
            PrecipitationStep::FinalReact(phase) => Some(&phase.model),
            _ => None,
        }
    }

    fn unknown_phase(&self) -> Option<&UnknownReactantPhase> {
        match self.chain.current() {
            PrecipitationStep::React(phase) => Some(&phase.previous),
            PrecipitationStep::ExtraReactant(phase) => Some(&phase.previous.previous),
            PrecipitationStep::FinalReact(phase) => Some(&phase.previous.previous.previous),
            _ => None,
        }
    }

    pub fn precipitate_mass(&self) -> f64 {
        let Some(unknown) = self.unknown_phase() else {
            return 0.0;
        };
        let product = self
            .model()
            .map_or(0, |m| m.molecule_counts(PrecipitationMolecule::Product));
        let settings = unknown.settings();
        product as f64 * settings.moles_per_molecule * settings.product_molar_mass
    }

    /// Molar mass of the unknown reactant from the weighed precipitate.
    /// Only available once every unknown molecule has reacted.
    pub fn estimated_unknown_molar_mass(&self) -> Option<f64> {
        let unknown = self.unknown_phase()?;
        let model = self.model()?;
        if model.molecule_counts(PrecipitationMolecule::UnknownReactant) > 0 {
            return None;
        }
        let moles = self.precipitate_mass() / unknown.settings().product_molar_mass;
        if moles <= 0.0 {
            return None;
        }
        Some(unknown.unknown_mass() / moles)
    }

    pub fn can_go_back(&self) -> bool {
        self.chain.can_go_back()
    }

    pub fn back(&mut self) -> &PrecipitationStep {
        self.chain.back()
    }
}
