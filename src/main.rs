// main.rs
// Runs a scenario file through every experiment and prints the report as JSON

use log::{error, info, warn};
use reaction_sim::config;
use reaction_sim::scenario::{run_scenario, ScenarioConfig};

fn main() {
    env_logger::init();

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| config::DEFAULT_SCENARIO_FILE.to_string());
    let scenario = match ScenarioConfig::load_from_file(&path) {
        Ok(scenario) => {
            info!("Loaded scenario from {}", path);
            scenario
        }
        Err(e) => {
            warn!("Failed to load {}: {}", path, e);
            warn!("Using default scenario");
            ScenarioConfig::default()
        }
    };

    let report = match run_scenario(&scenario) {
        Ok(report) => report,
        Err(e) => {
            error!("Scenario failed: {}", e);
            std::process::exit(1);
        }
    };
    match serde_json::to_string_pretty(&report) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            error!("Failed to serialize report: {}", e);
            std::process::exit(1);
        }
    }
}
