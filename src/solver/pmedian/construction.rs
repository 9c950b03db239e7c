use std::collections::BinaryHeap;

use tracing::{debug, span, trace, Level};

use crate::domain::problem::Problem;
use crate::error::Result;
use crate::evaluation::cost::Cost;
use crate::evaluation::evaluated_solution::EvaluatedSolution;
use crate::solver::callback::{ContinueCallback, Phase};

use super::regret::{QueuedRegret, Regret};
use super::search::Solver;

impl<'a> Solver<'a> {
    /// Polls the callback, then builds a solution around `centres`.
    /// Returns `None` only when the run was cancelled.
    pub(super) fn regret_based_assignment(
        &mut self,
        centres: &[Option<usize>],
        phase: Phase,
        callback: &mut dyn ContinueCallback,
    ) -> Result<Option<EvaluatedSolution<'a>>> {
        if !self.poll(callback, phase) && self.cancelled() {
            return Ok(None);
        }
        regret_assign(self.problem, centres).map(Some)
    }

    /// Re-runs the assignment around the current centres (which have moved
    /// to their medoids) until the cost stops improving.
    pub(super) fn regret_reassign_loop(
        &mut self,
        mut current: EvaluatedSolution<'a>,
        callback: &mut dyn ContinueCallback,
    ) -> Result<Option<EvaluatedSolution<'a>>> {
        let span = span!(Level::DEBUG, "regret_reassign");
        let _guard = span.enter();

        while !self.halted() {
            let centres = current.centres();
            let Some(candidate) =
                self.regret_based_assignment(&centres, Phase::RegretReassign, callback)?
            else {
                return Ok(None);
            };

            if !candidate.cost().is_better_than(&current.cost()) {
                break;
            }
            debug!(
                "Re-centred assignment improved cost to {:.3} (violation {:.3})",
                candidate.cost().travel,
                candidate.cost().capacity_violation
            );
            current = candidate;
            self.update_best(&current);
        }

        Ok(Some(current))
    }
}

/// Seeds a solution from `centres` and assigns every other customer in
/// descending order of regret, keeping centres pinned until all are placed.
pub fn regret_assign<'a>(
    problem: &'a Problem,
    centres: &[Option<usize>],
) -> Result<EvaluatedSolution<'a>> {
    let mut solution = EvaluatedSolution::new(problem, centres)?;
    solution.set_all_centres_immutable(true);

    let mut pending: Vec<usize> = solution.unassigned().collect();
    if problem.cluster_count() < 2 {
        if problem.cluster_count() == 1 && solution.centre(0).is_some() {
            for &customer in &pending {
                solution.set_customer_to_cluster(customer, Some(0))?;
            }
        }
    } else {
        assign_by_regret(&mut solution, &mut pending)?;
    }

    solution.set_all_centres_immutable(false);
    solution.update()?;
    Ok(solution)
}

fn assign_by_regret(solution: &mut EvaluatedSolution, pending: &mut Vec<usize>) -> Result<()> {
    let customers = solution.problem().location_count();
    let mut costs: Vec<Vec<Cost>> = vec![Vec::new(); customers];
    let mut regrets: Vec<Option<Regret>> = vec![None; customers];
    let mut versions = vec![0u32; customers];
    let mut queue = BinaryHeap::with_capacity(pending.len());

    for &customer in pending.iter() {
        let row = cluster_costs(solution, customer)?;
        let regret = Regret::new(customer, &row)?;
        costs[customer] = row;
        regrets[customer] = Some(regret);
        queue.push(QueuedRegret { regret, version: 0 });
    }

    while let Some(entry) = queue.pop() {
        let customer = entry.regret.customer;
        if entry.version != versions[customer] || solution.cluster_of(customer).is_some() {
            continue;
        }
        pending.retain(|&c| c != customer);

        let Some(cluster) = entry.regret.best else {
            trace!("Customer {} has no available cluster, leaving unassigned", customer);
            continue;
        };
        solution.set_customer_to_cluster(customer, Some(cluster))?;

        // Only the filled cluster changed, so only that column needs re-evaluating.
        for &other in pending.iter() {
            let updated = solution.evaluate_set(other, Some(cluster))?;
            if updated == costs[other][cluster] {
                continue;
            }
            let affected = regrets[other]
                .map_or(true, |regret| regret.affected_by(cluster, &updated, &costs[other]));
            costs[other][cluster] = updated;
            if affected {
                let regret = Regret::new(other, &costs[other])?;
                versions[other] += 1;
                regrets[other] = Some(regret);
                queue.push(QueuedRegret {
                    regret,
                    version: versions[other],
                });
            }
        }
    }

    Ok(())
}

fn cluster_costs(solution: &mut EvaluatedSolution, customer: usize) -> Result<Vec<Cost>> {
    (0..solution.problem().cluster_count())
        .map(|cluster| match solution.centre(cluster) {
            Some(_) => solution.evaluate_set(customer, Some(cluster)),
            None => Ok(Cost::max()),
        })
        .collect()
}
