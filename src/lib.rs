pub mod config;
pub mod domain;
pub mod error;
pub mod evaluation;
pub mod fixtures;
pub mod setup;
pub mod solver;
pub mod utils;

pub use config::SolverConfig;
pub use domain::problem::Problem;
pub use domain::solution::{ClusterSolution, Solution};
pub use domain::types::{Cluster, Location, TravelEdge};
pub use error::{Error, InvariantViolation, Result};
pub use evaluation::cost::Cost;
pub use evaluation::evaluated_solution::EvaluatedSolution;
pub use solver::callback::{from_fn, ContinueCallback, ContinueResult, Phase, StepLimit};
pub use solver::pmedian::{solve, Solver};
