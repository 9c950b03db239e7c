use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, span, warn, Level};

use crate::config::SolverConfig;
use crate::domain::problem::Problem;
use crate::domain::solution::Solution;
use crate::error::Result;
use crate::evaluation::evaluated_solution::EvaluatedSolution;
use crate::solver::callback::{ContinueCallback, ContinueResult, Phase};

/// Capacitated p-median solver: iterated local search over centre sets.
///
/// Each iteration picks centres (random or a mutation of the best set),
/// assigns customers by regret, re-centres until stable and finishes with
/// move/swap local search. The best solution seen is kept as a deep copy.
///
/// [`Solver::solve`] takes `&mut self`, so one instance never runs twice at once.
pub struct Solver<'a> {
    pub(super) problem: &'a Problem,
    pub(super) config: SolverConfig,
    pub(super) rng: ChaCha8Rng,
    pub(super) best: Option<EvaluatedSolution<'a>>,
    best_view: Option<Solution>,
    step: u64,
    halt: Option<ContinueResult>,
}

impl<'a> Solver<'a> {
    pub fn new(problem: &'a Problem, config: SolverConfig) -> Self {
        let rng = ChaCha8Rng::seed_from_u64(config.seed);
        Self {
            problem,
            config,
            rng,
            best: None,
            best_view: None,
            step: 0,
            halt: None,
        }
    }

    /// Runs until the callback asks to stop.
    ///
    /// `FinishNow` is honoured once a solution exists and returns the best one;
    /// `UserCancelled` returns `Ok(None)` straight away. Runs are deterministic
    /// for a given problem, config and sequence of callback answers.
    pub fn solve(&mut self, callback: &mut dyn ContinueCallback) -> Result<Option<Solution>> {
        self.reset();
        if !self.config.use_swaps && !self.config.use_insertion_moves {
            warn!("Both swaps and insertion moves are disabled, local search cannot improve");
        }
        info!(
            "Solving {} locations into {} clusters",
            self.problem.location_count(),
            self.problem.cluster_count()
        );

        let solve_span = span!(Level::INFO, "solve");
        let _solve_guard = solve_span.enter();

        let mut iteration = 0u64;
        while !self.halted() {
            iteration += 1;
            let iteration_span = span!(Level::DEBUG, "iteration", iter = iteration);
            let _iteration_guard = iteration_span.enter();

            let centres = self.generate_centres();
            let Some(solution) =
                self.regret_based_assignment(&centres, Phase::InitialAssign, callback)?
            else {
                break;
            };
            self.update_best(&solution);
            if self.halted() {
                break;
            }

            let Some(mut solution) = self.regret_reassign_loop(solution, callback)? else {
                break;
            };
            if self.halted() {
                break;
            }

            self.local_search_loop(&mut solution, callback)?;
        }

        if self.cancelled() {
            info!("Run cancelled after {} steps", self.step);
            return Ok(None);
        }

        if let Some(best) = &self.best_view {
            info!(
                "Finished after {} iterations and {} steps: travel {:.3}, violation {:.3}",
                iteration, self.step, best.cost.travel, best.cost.capacity_violation
            );
        }
        Ok(self.best_view.clone())
    }

    /// Number of callback polls made by the current or last run.
    pub fn steps(&self) -> u64 {
        self.step
    }

    pub fn best(&self) -> Option<&EvaluatedSolution<'a>> {
        self.best.as_ref()
    }

    fn reset(&mut self) {
        self.rng = ChaCha8Rng::seed_from_u64(self.config.seed);
        self.best = None;
        self.best_view = None;
        self.step = 0;
        self.halt = None;
    }

    /// Keeps a deep copy of `candidate` when it beats the best by more than round-off.
    pub(super) fn update_best(&mut self, candidate: &EvaluatedSolution<'a>) {
        let improved = self
            .best
            .as_ref()
            .map_or(true, |best| candidate.cost().is_better_than(&best.cost()));
        if improved {
            info!(
                "New best at step {}: travel {:.3}, violation {:.3}",
                self.step,
                candidate.cost().travel,
                candidate.cost().capacity_violation
            );
            self.best_view = Some(Solution::from(candidate));
            self.best = Some(candidate.clone());
        }
    }

    /// Asks the callback whether to continue. False once the run must stop.
    pub(super) fn poll(&mut self, callback: &mut dyn ContinueCallback, phase: Phase) -> bool {
        if self.halt.is_some() {
            return false;
        }

        let step = self.step;
        self.step += 1;
        match callback.continue_solving(step, phase, self.best_view.as_ref()) {
            ContinueResult::KeepGoing => true,
            ContinueResult::FinishNow if self.best.is_none() => {
                debug!("Finish requested at step {} before any solution exists, continuing", step);
                true
            }
            result => {
                debug!("Stopping at step {} during {}: {:?}", step, phase, result);
                self.halt = Some(result);
                false
            }
        }
    }

    pub(super) fn halted(&self) -> bool {
        self.halt.is_some()
    }

    pub(super) fn cancelled(&self) -> bool {
        self.halt == Some(ContinueResult::UserCancelled)
    }
}

/// Solves `problem` with a fresh [`Solver`].
pub fn solve(
    problem: &Problem,
    config: SolverConfig,
    callback: &mut dyn ContinueCallback,
) -> Result<Option<Solution>> {
    Solver::new(problem, config).solve(callback)
}
