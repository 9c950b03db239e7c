use itertools::Itertools;
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{debug, span, trace, Level};

use crate::error::Result;
use crate::evaluation::cost::Cost;
use crate::evaluation::evaluated_solution::EvaluatedSolution;
use crate::solver::callback::{ContinueCallback, Phase};
use crate::utils::{approx_equal, compare_floats};

use super::search::Solver;

impl<'a> Solver<'a> {
    /// Runs local search passes until one fails to improve or the run halts.
    pub(super) fn local_search_loop(
        &mut self,
        solution: &mut EvaluatedSolution<'a>,
        callback: &mut dyn ContinueCallback,
    ) -> Result<()> {
        let span = span!(Level::DEBUG, "local_search");
        let _guard = span.enter();

        let mut passes = 0;
        while !self.halted() && self.local_search_single_step(solution, callback)? {
            passes += 1;
            debug!(
                "Local search pass {} improved cost to {:.3} (violation {:.3})",
                passes,
                solution.cost().travel,
                solution.cost().capacity_violation
            );
        }
        Ok(())
    }

    /// One pass over every cluster in random order, trying moves and swaps
    /// with its nearest clusters. True when the pass improved the cost.
    pub(super) fn local_search_single_step(
        &mut self,
        solution: &mut EvaluatedSolution<'a>,
        callback: &mut dyn ContinueCallback,
    ) -> Result<bool> {
        let before = solution.cost();
        let neighbours = nearest_clusters(solution, self.config.nearest_clusters);

        let mut order: Vec<usize> = (0..neighbours.len()).collect();
        order.shuffle(&mut self.rng);

        for cluster in order {
            let mut targets = neighbours[cluster].clone();
            targets.shuffle(&mut self.rng);

            for target in targets {
                if self.rng.gen_bool(0.5) {
                    self.try_moves(solution, cluster, target)?;
                    self.try_swaps(solution, cluster, target)?;
                } else {
                    self.try_swaps(solution, cluster, target)?;
                    self.try_moves(solution, cluster, target)?;
                }
            }

            solution.update()?;
            self.update_best(solution);
            if !self.poll(callback, Phase::LocalSearch) {
                break;
            }
        }

        Ok(solution.cost().is_better_than(&before))
    }

    fn try_moves(
        &self,
        solution: &mut EvaluatedSolution<'a>,
        from: usize,
        to: usize,
    ) -> Result<()> {
        if self.config.use_insertion_moves {
            intercluster_moves(solution, from, to)?;
        }
        Ok(())
    }

    fn try_swaps(
        &self,
        solution: &mut EvaluatedSolution<'a>,
        from: usize,
        to: usize,
    ) -> Result<()> {
        if self.config.use_swaps {
            intercluster_swaps(solution, from, to)?;
        }
        Ok(())
    }
}

/// For each cluster, up to `k` other clusters ordered by the smallest travel
/// between any pair of their members. Empty clusters have no neighbours.
pub fn nearest_clusters(solution: &EvaluatedSolution, k: usize) -> Vec<Vec<usize>> {
    let problem = solution.problem();
    let clusters = problem.cluster_count();
    let mut proximity = vec![f64::INFINITY; clusters * clusters];

    for a in 0..problem.location_count() {
        let Some(cluster_a) = solution.cluster_of(a) else {
            continue;
        };
        for b in (a + 1)..problem.location_count() {
            let Some(cluster_b) = solution.cluster_of(b) else {
                continue;
            };
            if cluster_a == cluster_b {
                continue;
            }
            let distance = problem.travel(a, b).min(problem.travel(b, a));
            let forward = cluster_a * clusters + cluster_b;
            let backward = cluster_b * clusters + cluster_a;
            proximity[forward] = proximity[forward].min(distance);
            proximity[backward] = proximity[backward].min(distance);
        }
    }

    (0..clusters)
        .map(|i| {
            let row = &proximity[i * clusters..(i + 1) * clusters];
            (0..clusters)
                .filter(|&j| j != i && row[j].is_finite())
                .sorted_by(|&x, &y| compare_floats(row[x], row[y]).then(x.cmp(&y)))
                .take(k)
                .collect()
        })
        .collect()
}

/// Relocates members of `from` to `to` whenever that worsens neither
/// capacity violation nor travel. Returns the number of moves made.
pub fn intercluster_moves(
    solution: &mut EvaluatedSolution,
    from: usize,
    to: usize,
) -> Result<usize> {
    let mut moved = 0;
    for customer in solution.members(from).to_vec() {
        if solution.cluster_of(customer) != Some(from) || solution.is_pinned_centre(customer) {
            continue;
        }
        let delta = solution.evaluate_set(customer, Some(to))?;
        if is_improving(&delta) {
            trace!("Moving customer {} from cluster {} to {}", customer, from, to);
            solution.set_customer_to_cluster(customer, Some(to))?;
            moved += 1;
        }
    }
    Ok(moved)
}

/// For each member of `from`, finds its best swap partner in `to` and
/// applies the swap when it worsens neither component. Returns the swap count.
pub fn intercluster_swaps(
    solution: &mut EvaluatedSolution,
    from: usize,
    to: usize,
) -> Result<usize> {
    let mut swapped = 0;
    for customer in solution.members(from).to_vec() {
        if solution.cluster_of(customer) != Some(from) || solution.is_pinned_centre(customer) {
            continue;
        }

        let mut best: Option<(usize, Cost)> = None;
        for partner in solution.members(to).to_vec() {
            if solution.is_pinned_centre(partner) {
                continue;
            }
            let delta = solution.evaluate_swap(customer, partner)?;
            if best.map_or(true, |(_, current)| delta < current) {
                best = Some((partner, delta));
            }
        }

        if let Some((partner, delta)) = best.filter(|(_, delta)| is_improving(delta)) {
            trace!(
                "Swapping customer {} (cluster {}) with {} (cluster {}), delta {:?}",
                customer,
                from,
                partner,
                to,
                delta
            );
            solution.set_customer_to_cluster(customer, Some(to))?;
            solution.set_customer_to_cluster(partner, Some(from))?;
            swapped += 1;
        }
    }
    Ok(swapped)
}

// Neither component worsens and at least one improves beyond round-off.
fn is_improving(delta: &Cost) -> bool {
    let non_worsening = |x: f64| x <= 0.0 || approx_equal(x, 0.0);
    let improving = |x: f64| x < 0.0 && !approx_equal(x, 0.0);
    non_worsening(delta.capacity_violation)
        && non_worsening(delta.travel)
        && (improving(delta.capacity_violation) || improving(delta.travel))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::problem::Problem;
    use crate::domain::types::{Cluster, Location, TravelEdge};

    fn line_problem(positions: &[f64], clusters: Vec<Cluster>) -> Problem {
        let locations = (0..positions.len()).map(|i| Location::new(format!("l{i}"), 1.0));
        let mut edges = Vec::new();
        for (i, a) in positions.iter().enumerate() {
            for (j, b) in positions.iter().enumerate() {
                edges.push(TravelEdge::new(format!("l{i}"), format!("l{j}"), (a - b).abs()));
            }
        }
        Problem::new(locations, clusters, edges).unwrap()
    }

    fn seeded<'a>(
        problem: &'a Problem,
        centres: &[Option<usize>],
        assignment: &[(usize, usize)],
    ) -> EvaluatedSolution<'a> {
        let mut solution = EvaluatedSolution::new(problem, centres).unwrap();
        for &(customer, cluster) in assignment {
            solution.set_customer_to_cluster(customer, Some(cluster)).unwrap();
        }
        solution
    }

    #[test]
    fn nearest_clusters_orders_by_closest_members() {
        let problem = line_problem(
            &[0.0, 1.0, 10.0, 11.0, 30.0, 31.0],
            vec![
                Cluster::new("a", 9.0),
                Cluster::new("b", 9.0),
                Cluster::new("c", 9.0),
                Cluster::new("d", 9.0),
            ],
        );
        let solution = seeded(
            &problem,
            &[Some(0), Some(2), Some(4), None],
            &[(1, 0), (3, 1), (5, 2)],
        );
        let neighbours = nearest_clusters(&solution, 5);
        assert_eq!(neighbours[0], vec![1, 2]);
        assert_eq!(neighbours[1], vec![0, 2]);
        assert_eq!(neighbours[2], vec![1, 0]);
        assert!(neighbours[3].is_empty());
        assert_eq!(nearest_clusters(&solution, 1)[2], vec![1]);
    }

    #[test]
    fn moves_misplaced_customer_to_closer_cluster() {
        let problem = line_problem(
            &[0.0, 1.0, 9.0, 10.0, 11.0],
            vec![Cluster::new("a", 9.0), Cluster::new("b", 9.0)],
        );
        let mut solution = seeded(&problem, &[Some(0), Some(3)], &[(1, 0), (2, 0), (4, 1)]);
        let before = solution.cost();
        assert_eq!(intercluster_moves(&mut solution, 0, 1).unwrap(), 1);
        assert_eq!(solution.cluster_of(2), Some(1));
        assert!(solution.cost() < before);
    }

    #[test]
    fn moves_never_trade_capacity_for_travel() {
        let problem = line_problem(
            &[0.0, 1.0, 9.0, 10.0],
            vec![Cluster::new("a", 9.0), Cluster::new("b", 1.0)],
        );
        let mut solution = seeded(&problem, &[Some(0), Some(3)], &[(1, 0), (2, 0)]);
        assert_eq!(intercluster_moves(&mut solution, 0, 1).unwrap(), 0);
        assert_eq!(solution.cluster_of(2), Some(0));
    }

    #[test]
    fn swaps_exchange_crossed_customers() {
        let problem = line_problem(
            &[0.0, 1.0, 10.0, 11.0],
            vec![Cluster::new("a", 2.0), Cluster::new("b", 2.0)],
        );
        let mut solution = seeded(&problem, &[Some(0), Some(2)], &[(3, 0), (1, 1)]);
        assert_eq!(intercluster_moves(&mut solution, 0, 1).unwrap(), 0);
        assert_eq!(intercluster_swaps(&mut solution, 0, 1).unwrap(), 1);
        assert_eq!(solution.cluster_of(1), solution.cluster_of(0));
        assert_eq!(solution.cluster_of(3), solution.cluster_of(2));
        assert_eq!(solution.cost(), Cost::new(2.0, 0.0));
    }

    #[test]
    fn fixed_centres_are_never_moved_or_swapped() {
        let problem = line_problem(
            &[0.0, 10.0, 11.0, 12.0],
            vec![Cluster::new("a", 9.0).fixed_to("l0"), Cluster::new("b", 9.0)],
        );
        let mut solution = seeded(&problem, &[Some(0), Some(2)], &[(1, 1), (3, 1)]);
        intercluster_moves(&mut solution, 0, 1).unwrap();
        intercluster_swaps(&mut solution, 0, 1).unwrap();
        intercluster_swaps(&mut solution, 1, 0).unwrap();
        assert_eq!(solution.cluster_of(0), Some(0));
        assert_eq!(solution.centre(0), Some(0));
    }

    #[test]
    fn improvement_requires_no_worsening_component() {
        assert!(is_improving(&Cost::new(-1.0, 0.0)));
        assert!(is_improving(&Cost::new(0.0, -1.0)));
        assert!(!is_improving(&Cost::new(1.0, -1.0)));
        assert!(!is_improving(&Cost::new(-1e-12, 0.0)));
        assert!(!is_improving(&Cost::zero()));
    }
}
