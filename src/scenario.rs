// scenario.rs
// Loads a scenario file and runs every experiment through its phases, producing a serializable report

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::chemistry::acid_preset;
use crate::config;
use crate::equation::Series;
use crate::experiment::buffer::{BufferExperiment, BufferSettings, BufferStep};
use crate::experiment::dissociation::{DissociationComponents, DissociationExperiment, DissociationSettings};
use crate::experiment::precipitation::{
    LimitingReactant, PrecipitationExperiment, PrecipitationSettings, PrecipitationStep,
};
use crate::experiment::titration::{TitrationExperiment, TitrationSettings};
use crate::grid::Grid;
use crate::molecule::{AcidBaseMolecule, MoleculeKind};
use crate::reaction::observer::{ObservedProgress, ProgressObserver};
use crate::reaction::ReactionProgressModel;

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct ScenarioConfig {
    /// Overrides the grid of every experiment.
    pub grid: Option<Grid>,
    /// Overrides the seed of every experiment.
    pub seed: Option<u64>,
    /// Named acid from the preset table, overriding Ka of the acid experiments.
    pub acid: Option<String>,
    pub series_points: Option<usize>,
    #[serde(default)]
    pub dissociation: DissociationSettings,
    #[serde(default)]
    pub buffer: BufferSettings,
    #[serde(default)]
    pub titration: TitrationSettings,
    #[serde(default)]
    pub precipitation: PrecipitationSettings,
}

impl ScenarioConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let content = fs::read_to_string(path)?;
        let config: ScenarioConfig = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn load_default() -> Result<Self, Box<dyn std::error::Error>> {
        Self::load_from_file(config::DEFAULT_SCENARIO_FILE)
    }

    /// Copies the top-level overrides into every experiment section.
    pub fn resolved(&self) -> Result<Self, String> {
        let mut resolved = self.clone();
        if let Some(grid) = self.grid {
            resolved.dissociation.grid = grid;
            resolved.buffer.substance.grid = grid;
            resolved.titration.grid = grid;
            resolved.precipitation.grid = grid;
        }
        if let Some(seed) = self.seed {
            resolved.dissociation.seed = seed;
            resolved.buffer.substance.seed = seed;
            resolved.titration.seed = seed;
            resolved.precipitation.seed = seed;
        }
        if let Some(name) = &self.acid {
            let preset = acid_preset(name).ok_or_else(|| format!("unknown acid preset '{}'", name))?;
            debug!("using {} ({}) with Ka {}", preset.name, preset.formula, preset.ka);
            resolved.dissociation.ka = preset.ka;
            resolved.buffer.substance.ka = preset.ka;
            resolved.titration.ka = preset.ka;
        }
        Ok(resolved)
    }

    pub fn validate(&self) -> Result<(), String> {
        if let Some(grid) = self.grid {
            if grid.rows == 0 || grid.cols == 0 {
                return Err(format!("grid must not be empty, got {}x{}", grid.rows, grid.cols));
            }
        }
        if let Some(points) = self.series_points {
            if points < 2 {
                return Err(format!("series_points must be at least 2, got {}", points));
            }
        }
        self.dissociation.validate()?;
        self.buffer.validate()?;
        self.titration.validate()?;
        self.precipitation.validate()?;
        Ok(())
    }

    fn points(&self) -> usize {
        self.series_points.unwrap_or(config::DEFAULT_SERIES_POINTS)
    }
}

#[derive(Debug, Serialize)]
pub struct DissociationReport {
    pub substance_count: usize,
    pub final_ph: f64,
    pub ph_series: Series,
    pub count_history: Vec<BTreeMap<String, usize>>,
    pub counts: BTreeMap<String, usize>,
}

#[derive(Debug, Serialize)]
pub struct BufferReport {
    pub salt_added: usize,
    pub buffered_ph: f64,
    pub strong_ph_series: Series,
    pub counts: BTreeMap<String, usize>,
}

#[derive(Debug, Serialize)]
pub struct TitrationReport {
    pub equivalence_point: f64,
    pub initial_ph: f64,
    pub equivalence_ph: f64,
    pub curve: Series,
    pub counts: BTreeMap<String, usize>,
}

#[derive(Debug, Serialize)]
pub struct PrecipitationReport {
    pub limiting_reactant: LimitingReactant,
    pub precipitate_mass: f64,
    pub estimated_unknown_molar_mass: Option<f64>,
    pub counts: BTreeMap<String, usize>,
}

#[derive(Debug, Serialize)]
pub struct ScenarioReport {
    pub dissociation: DissociationReport,
    pub buffer: BufferReport,
    pub titration: TitrationReport,
    pub precipitation: PrecipitationReport,
}

pub fn named_counts<K: MoleculeKind>(model: &ReactionProgressModel<K>) -> BTreeMap<String, usize> {
    K::ALL
        .iter()
        .map(|kind| (kind.name().to_string(), model.molecule_counts(*kind)))
        .collect()
}

/// Keeps a copy of the counts after every change.
#[derive(Default)]
struct CountHistory {
    snapshots: Vec<BTreeMap<String, usize>>,
}

impl<K: MoleculeKind> ProgressObserver<K> for CountHistory {
    fn counts_changed(&mut self, counts: &BTreeMap<K, usize>) {
        debug!("counts changed: {:?}", counts);
        self.snapshots
            .push(counts.iter().map(|(k, v)| (k.name().to_string(), *v)).collect());
    }
}

fn run_dissociation(settings: &DissociationSettings, points: usize) -> Result<DissociationReport, String> {
    let mut experiment = DissociationExperiment::new(settings.clone());
    experiment.add_substance(settings.max_substance);
    if !experiment.start_dissociation() {
        return Err("not enough substance to start dissociation".to_string());
    }
    let phase = experiment
        .dissociation()
        .ok_or("dissociation phase missing")?;
    let components = phase.components.clone();

    let mut observed = ObservedProgress::new(phase.model.copy(), CountHistory::default());
    let reaction = DissociationComponents::reaction();
    let target = components.ion_count_equation();
    for i in 0..points {
        let progress = i as f64 / (points - 1) as f64;
        observed.reconcile_reaction(&reaction, AcidBaseMolecule::PrimaryIon, &target, progress);
    }
    let (model, history) = observed.into_parts();

    experiment.set_progress(1.0);
    let phase = experiment
        .dissociation()
        .ok_or("dissociation phase missing")?;
    if model.counts() != phase.model.counts() {
        warn!("stepped dissociation ended at {:?}, direct at {:?}", model.counts(), phase.model.counts());
    }
    Ok(DissociationReport {
        substance_count: components.substance_count,
        final_ph: phase.ph(),
        ph_series: components.ph_equation().sample(0.0, 1.0, points),
        count_history: history.snapshots,
        counts: named_counts(&phase.model),
    })
}

fn run_buffer(settings: &BufferSettings, points: usize) -> Result<BufferReport, String> {
    let mut experiment = BufferExperiment::new(settings.clone());
    experiment.add_substance(settings.substance.max_substance);
    if !experiment.start_salt() {
        return Err("not enough substance to start the buffer".to_string());
    }
    let salt_added = experiment.add_salt(settings.max_salt);
    let buffered_ph = experiment.ph().ok_or("buffer pH unavailable")?;
    if !experiment.start_strong() {
        return Err("no salt added to the buffer".to_string());
    }
    experiment.add_strong(settings.max_strong);
    let BufferStep::StrongSubstance(phase) = experiment.step() else {
        return Err("buffer did not reach the strong substance phase".to_string());
    };
    Ok(BufferReport {
        salt_added,
        buffered_ph,
        strong_ph_series: phase.ph_equation().sample(0.0, settings.max_strong as f64, points),
        counts: named_counts(&phase.model),
    })
}

fn run_titration(settings: &TitrationSettings, points: usize) -> Result<TitrationReport, String> {
    let mut experiment = TitrationExperiment::new(settings.clone());
    experiment.add_substance(settings.max_substance);
    if !experiment.start_titration() {
        return Err("not enough substance to titrate".to_string());
    }
    experiment.add_titrant(settings.max_substance);
    if !experiment.pass_equivalence() {
        return Err("titration did not reach equivalence".to_string());
    }
    experiment.add_titrant(settings.max_excess_titrant);
    let components = experiment.components().ok_or("titration components missing")?;
    let model = experiment.model().ok_or("titration model missing")?;
    Ok(TitrationReport {
        equivalence_point: components.equivalence_point(),
        initial_ph: components.initial_ph(),
        equivalence_ph: components.equivalence_ph(),
        curve: components.sample_curve(settings.max_excess_titrant, points),
        counts: named_counts(model),
    })
}

fn run_precipitation(settings: &PrecipitationSettings) -> Result<PrecipitationReport, String> {
    let mut experiment = PrecipitationExperiment::new(settings.clone());
    experiment.add_reactant(settings.max_known);
    if !experiment.next() {
        return Err("not enough known reactant".to_string());
    }
    experiment.add_reactant(settings.max_unknown);
    if !experiment.next() {
        return Err("not enough unknown reactant".to_string());
    }
    let limiting_reactant = match experiment.step() {
        PrecipitationStep::React(phase) => phase.limiting_reactant(),
        _ => return Err("precipitation did not reach the react phase".to_string()),
    };
    experiment.set_progress(1.0);
    if experiment.next() {
        info!("unknown reactant left over, adding more known reactant");
        experiment.add_reactant(settings.max_extra);
        if experiment.next() {
            experiment.set_progress(1.0);
        } else {
            warn!("extra known reactant fell short of the leftover unknown");
        }
    }
    let model = experiment.model().ok_or("precipitation model missing")?;
    Ok(PrecipitationReport {
        limiting_reactant,
        precipitate_mass: experiment.precipitate_mass(),
        estimated_unknown_molar_mass: experiment.estimated_unknown_molar_mass(),
        counts: named_counts(model),
    })
}

/// Runs every experiment of the scenario end to end.
pub fn run_scenario(scenario: &ScenarioConfig) -> Result<ScenarioReport, Box<dyn std::error::Error>> {
    let scenario = scenario.resolved()?;
    scenario.validate()?;
    let points = scenario.points();

    let report = ScenarioReport {
        dissociation: run_dissociation(&scenario.dissociation, points)?,
        buffer: run_buffer(&scenario.buffer, points)?,
        titration: run_titration(&scenario.titration, points)?,
        precipitation: run_precipitation(&scenario.precipitation)?,
    };
    info!(
        "scenario done: dissociation pH {:.2}, equivalence pH {:.2}, precipitate {:.3} g",
        report.dissociation.final_ph, report.titration.equivalence_ph, report.precipitation.precipitate_mass
    );
    Ok(report)
}
