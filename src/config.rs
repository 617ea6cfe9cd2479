// Centralized configuration for simulation parameters

// ====================
// Grid Parameters
// ====================
/// Default number of rows in the beaker grid.
pub const DEFAULT_GRID_ROWS: usize = 10;
/// Default number of columns in the beaker grid.
pub const DEFAULT_GRID_COLS: usize = 10;
/// Seed used when a scenario does not provide one.
pub const DEFAULT_SEED: u64 = 7;

// ====================
// Reaction Progress Parameters
// ====================
/// Maximum molecules of a single kind the progress model will hold.
pub const DEFAULT_MAX_MOLECULES_PER_KIND: usize = 200;
/// Duration (seconds) of a single molecule appearing.
pub const MOLECULE_APPEAR_DURATION: f64 = 0.5;
/// Duration (seconds) of a single reaction unit.
pub const REACTION_DURATION: f64 = 1.0;

// ====================
// Chemistry Parameters
// ====================
/// Ion product of water at 25 °C.
pub const KW: f64 = 1e-14;
/// [H⁺] and [OH⁻] of pure water.
pub const PURE_WATER_ION_CONCENTRATION: f64 = 1e-7;
/// pH scale upper bound, pH + pOH.
pub const PH_SCALE: f64 = 14.0;

// ====================
// Numeric Parameters
// ====================
/// Tolerance used when comparing evaluated equations.
pub const EQUATION_TOLERANCE: f64 = 1e-9;
/// Default number of points when sampling an equation for charts.
pub const DEFAULT_SERIES_POINTS: usize = 21;

/// Default scenario file looked up by the runner binary.
pub const DEFAULT_SCENARIO_FILE: &str = "scenario.toml";
