use serde::{Deserialize, Serialize};
use std::env;
use tracing::warn;

pub mod constant {
    pub(crate) const SEED: u64 = 123;
    pub(crate) const NEAREST_CLUSTERS: usize = 5;
    // One fresh random centre set for every RANDOM_RESTART_ODDS iterations on average.
    pub(crate) const RANDOM_RESTART_ODDS: u32 = 3;
    pub(crate) const TOLERANCE: f64 = 1e-9;
    pub(crate) const UNREACHABLE_MULTIPLIER: f64 = 1000.0;

    pub(crate) const MAX_STEPS: u64 = 2000;
    pub(crate) const TIME_LIMIT_SECS: i64 = 60;
    pub(crate) const RANDOM_LOCATIONS: usize = 200;
    pub(crate) const RANDOM_CLUSTERS: usize = 8;
    pub(crate) const OUTPUT_CSV_PATH: &str = "assignments.csv";
}

/// Tunables of a single solver run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolverConfig {
    pub use_swaps: bool,
    pub use_insertion_moves: bool,
    /// Number of nearest clusters examined around each cluster during local search.
    pub nearest_clusters: usize,
    pub seed: u64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            use_swaps: true,
            use_insertion_moves: true,
            nearest_clusters: constant::NEAREST_CLUSTERS,
            seed: constant::SEED,
        }
    }
}

/// Settings of the command line runner, read from the environment (and `.env`).
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub locations_path: Option<String>,
    pub clusters_path: Option<String>,
    pub travel_path: Option<String>,
    pub max_steps: u64,
    pub time_limit_secs: i64,
    pub output_csv: String,
    pub output_json: Option<String>,
    pub random_locations: usize,
    pub random_clusters: usize,
    pub solver: SolverConfig,
}

impl RunConfig {
    pub fn from_env() -> Self {
        let solver = SolverConfig {
            use_swaps: parse_var("PMEDIAN_USE_SWAPS", true),
            use_insertion_moves: parse_var("PMEDIAN_USE_MOVES", true),
            ..SolverConfig::default()
        };

        Self {
            locations_path: env::var("PMEDIAN_LOCATIONS").ok(),
            clusters_path: env::var("PMEDIAN_CLUSTERS").ok(),
            travel_path: env::var("PMEDIAN_TRAVEL").ok(),
            max_steps: parse_var("PMEDIAN_MAX_STEPS", constant::MAX_STEPS),
            time_limit_secs: parse_var("PMEDIAN_TIME_LIMIT_SECS", constant::TIME_LIMIT_SECS),
            output_csv: env::var("PMEDIAN_OUTPUT_CSV")
                .unwrap_or_else(|_| constant::OUTPUT_CSV_PATH.to_string()),
            output_json: env::var("PMEDIAN_OUTPUT_JSON").ok(),
            random_locations: parse_var("PMEDIAN_RANDOM_LOCATIONS", constant::RANDOM_LOCATIONS),
            random_clusters: parse_var("PMEDIAN_RANDOM_CLUSTERS", constant::RANDOM_CLUSTERS),
            solver,
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                warn!("Ignoring unparsable {}='{}', using default", name, raw);
                default
            }
        },
        Err(_) => default,
    }
}
