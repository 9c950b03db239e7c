use std::error::Error;
use std::fs;

use chrono::Utc;
use colored::*;
use csv::Writer;
use dotenv::dotenv;
use tracing::{debug, info, span, warn, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::RunConfig;
use crate::domain::problem::Problem;
use crate::domain::solution::Solution;
use crate::evaluation::cost::Cost;
use crate::fixtures::data_generator::generate_random_problem;
use crate::setup::init::load_problem;
use crate::solver::callback::{ContinueCallback, ContinueResult, Phase};

use super::search::Solver;

/// Initialize tracing and environment
fn init_tracing_and_env() -> Result<(), Box<dyn Error>> {
    dotenv().ok();
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer().with_span_events(fmt::format::FmtSpan::CLOSE))
        .try_init()?;
    Ok(())
}

/// Stops the run after a step budget or a wall-clock limit, logging progress.
pub struct ProgressReporter {
    max_steps: u64,
    deadline: i64,
    best_cost: Option<Cost>,
    improvements: Vec<(u64, Phase, f64, f64)>,
}

impl ProgressReporter {
    pub fn new(max_steps: u64, time_limit_secs: i64) -> Self {
        Self {
            max_steps,
            deadline: Utc::now().timestamp().saturating_add(time_limit_secs),
            best_cost: None,
            improvements: Vec::new(),
        }
    }

    /// `(step, phase, travel, capacity violation)` for every new best seen.
    pub fn improvements(&self) -> &[(u64, Phase, f64, f64)] {
        &self.improvements
    }
}

impl ContinueCallback for ProgressReporter {
    fn continue_solving(
        &mut self,
        step: u64,
        phase: Phase,
        best: Option<&Solution>,
    ) -> ContinueResult {
        if let Some(best) = best {
            if self.best_cost != Some(best.cost) {
                debug!(
                    "Step {} ({}): best travel {:.3}, violation {:.3}",
                    step, phase, best.cost.travel, best.cost.capacity_violation
                );
                self.best_cost = Some(best.cost);
                self.improvements
                    .push((step, phase, best.cost.travel, best.cost.capacity_violation));
            }
        }

        if step >= self.max_steps {
            info!("Step limit {} reached", self.max_steps);
            ContinueResult::FinishNow
        } else if Utc::now().timestamp() >= self.deadline {
            info!("Time limit reached at step {}", step);
            ContinueResult::FinishNow
        } else {
            ContinueResult::KeepGoing
        }
    }
}

fn load_or_generate(config: &RunConfig) -> Result<Problem, Box<dyn Error>> {
    let span = span!(Level::INFO, "setup");
    let _guard = span.enter();

    match (&config.locations_path, &config.clusters_path) {
        (Some(locations), Some(clusters)) => {
            load_problem(locations, clusters, config.travel_path.as_deref())
        }
        (Some(_), None) | (None, Some(_)) => {
            Err("PMEDIAN_LOCATIONS and PMEDIAN_CLUSTERS must be set together".into())
        }
        (None, None) => {
            warn!(
                "No input files configured, generating {} random locations for {} clusters",
                config.random_locations, config.random_clusters
            );
            Ok(generate_random_problem(
                config.random_locations,
                config.random_clusters,
                config.solver.seed,
            )?)
        }
    }
}

pub fn run() -> Result<(), Box<dyn Error>> {
    init_tracing_and_env()?;
    let config = RunConfig::from_env();
    debug!("Run configuration: {:?}", config);

    let problem = load_or_generate(&config)?;
    let mut reporter = ProgressReporter::new(config.max_steps, config.time_limit_secs);

    let mut solver = Solver::new(&problem, config.solver.clone());
    let Some(solution) = solver.solve(&mut reporter)? else {
        warn!("Run was cancelled before producing a solution");
        return Ok(());
    };

    print_solution(&solution);
    info!(
        "{} improvements over {} steps",
        reporter.improvements().len(),
        solver.steps()
    );

    save_to_csv(&solution, &config.output_csv)?;
    info!("Assignments written to {}", config.output_csv);
    if let Some(path) = &config.output_json {
        fs::write(path, serde_json::to_string_pretty(&solution)?)?;
        info!("Solution written to {}", path);
    }

    Ok(())
}

fn save_to_csv(solution: &Solution, filename: &str) -> Result<(), Box<dyn Error>> {
    let mut wtr = Writer::from_path(filename)?;

    wtr.write_record(["location", "cluster", "centre"])?;
    for cluster in &solution.clusters {
        let centre = cluster.centre.as_deref().unwrap_or("");
        for member in &cluster.members {
            wtr.write_record([member.as_str(), cluster.id.as_str(), centre])?;
        }
    }
    for location in &solution.unassigned {
        wtr.write_record([location.as_str(), "", ""])?;
    }

    wtr.flush()?;
    Ok(())
}

fn print_solution(solution: &Solution) {
    for cluster in &solution.clusters {
        let line = format!(
            "{} centre {} : {} members, quantity {:.2}, travel {:.2}, violation {:.2}",
            cluster.id,
            cluster.centre.as_deref().unwrap_or("-"),
            cluster.members.len(),
            cluster.quantity,
            cluster.cost.travel,
            cluster.cost.capacity_violation
        );
        if cluster.cost.capacity_violation > 0.0 {
            warn!("{}", line);
        } else {
            info!("{}", line);
        }
    }
    if !solution.unassigned.is_empty() {
        warn!("Unassigned locations: {:?}", solution.unassigned);
    }

    let verdict = format!(
        "Travel: {:.2}, Capacity violation: {:.2}",
        solution.cost.travel, solution.cost.capacity_violation
    );
    if solution.cost.capacity_violation > 0.0 {
        println!("{}", verdict.red());
    } else {
        println!("{}", verdict.green());
    }
}
