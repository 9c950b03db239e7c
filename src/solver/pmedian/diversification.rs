use rand::seq::IteratorRandom;
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use tracing::debug;

use crate::config::constant::RANDOM_RESTART_ODDS;
use crate::domain::problem::Problem;

use super::search::Solver;

impl<'a> Solver<'a> {
    /// Centres for the next iteration: a fresh random set on the first
    /// iteration and one time in three, otherwise a mutation of the best set.
    pub(super) fn generate_centres(&mut self) -> Vec<Option<usize>> {
        let restart = self.best.is_none() || self.rng.gen_ratio(1, RANDOM_RESTART_ODDS);
        let best_centres = match &self.best {
            Some(best) if !restart => Some(best.centres()),
            _ => None,
        };

        match best_centres {
            Some(centres) => {
                debug!("Mutating best centre set");
                mutate_centres(self.problem, &centres, &mut self.rng)
            }
            None => {
                debug!("Generating random centre set");
                random_centres(self.problem, &mut self.rng)
            }
        }
    }
}

/// One random distinct location per cluster; fixed clusters keep their location.
pub fn random_centres(problem: &Problem, rng: &mut ChaCha8Rng) -> Vec<Option<usize>> {
    let mut centres = pinned_centres(problem);
    let free: Vec<usize> = free_slots(problem).collect();
    fill_slots(problem, &mut centres, &free, &[], rng);
    centres
}

/// Clears a random non-empty subset of the non-fixed centres and refills
/// those slots with random unclaimed locations. A cleared centre is only
/// reused when no other location is free.
pub fn mutate_centres(
    problem: &Problem,
    current: &[Option<usize>],
    rng: &mut ChaCha8Rng,
) -> Vec<Option<usize>> {
    let free: Vec<usize> = free_slots(problem).collect();
    if free.is_empty() {
        return pinned_centres(problem);
    }

    let count = rng.gen_range(1..=free.len());
    let cleared = free.iter().copied().choose_multiple(rng, count);

    let mut centres = current.to_vec();
    for (cluster, fixed) in pinned_centres(problem).into_iter().enumerate() {
        if fixed.is_some() {
            centres[cluster] = fixed;
        }
    }
    let retired: Vec<usize> = cleared.iter().filter_map(|&slot| centres[slot]).collect();
    for &slot in &cleared {
        centres[slot] = None;
    }
    fill_slots(problem, &mut centres, &cleared, &retired, rng);
    centres
}

fn pinned_centres(problem: &Problem) -> Vec<Option<usize>> {
    (0..problem.cluster_count())
        .map(|cluster| problem.fixed_location(cluster))
        .collect()
}

fn free_slots(problem: &Problem) -> impl Iterator<Item = usize> + '_ {
    (0..problem.cluster_count()).filter(|&cluster| problem.fixed_location(cluster).is_none())
}

// Slots stay empty once every location is claimed.
fn fill_slots(
    problem: &Problem,
    centres: &mut [Option<usize>],
    slots: &[usize],
    retired: &[usize],
    rng: &mut ChaCha8Rng,
) {
    let locations = problem.location_count();
    let mut claimed = vec![false; locations];
    for &location in centres.iter().flatten() {
        claimed[location] = true;
    }
    let mut avoided = vec![false; locations];
    for &location in retired {
        avoided[location] = true;
    }

    for &slot in slots {
        let fresh = (0..locations)
            .filter(|&location| !claimed[location] && !avoided[location])
            .choose(rng);
        let choice = match fresh {
            Some(location) => Some(location),
            None => (0..locations).filter(|&location| !claimed[location]).choose(rng),
        };
        if let Some(location) = choice {
            claimed[location] = true;
        }
        centres[slot] = choice;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::{Cluster, Location};
    use rand::SeedableRng;

    fn problem(locations: usize, clusters: Vec<Cluster>) -> Problem {
        let locations = (0..locations).map(|i| Location::new(format!("l{i}"), 1.0));
        Problem::new(locations, clusters, vec![]).unwrap()
    }

    fn distinct(centres: &[Option<usize>]) -> bool {
        let chosen: Vec<usize> = centres.iter().flatten().copied().collect();
        let mut sorted = chosen.clone();
        sorted.sort_unstable();
        sorted.dedup();
        sorted.len() == chosen.len()
    }

    #[test]
    fn random_centres_are_distinct_and_respect_fixed_clusters() {
        let problem = problem(
            10,
            vec![
                Cluster::new("a", 1.0),
                Cluster::new("b", 1.0).fixed_to("l4"),
                Cluster::new("c", 1.0),
            ],
        );
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..50 {
            let centres = random_centres(&problem, &mut rng);
            assert_eq!(centres[1], Some(4));
            assert!(centres.iter().all(|c| c.is_some()));
            assert!(distinct(&centres));
        }
    }

    #[test]
    fn surplus_clusters_stay_empty() {
        let clusters = vec![
            Cluster::new("a", 1.0),
            Cluster::new("b", 1.0),
            Cluster::new("c", 1.0),
        ];
        let problem = problem(2, clusters);
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let centres = random_centres(&problem, &mut rng);
        assert_eq!(centres.iter().flatten().count(), 2);
        assert!(distinct(&centres));
    }

    #[test]
    fn mutation_changes_only_free_slots() {
        let problem = problem(
            30,
            vec![
                Cluster::new("a", 1.0).fixed_to("l0"),
                Cluster::new("b", 1.0),
                Cluster::new("c", 1.0),
            ],
        );
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let current = vec![Some(0), Some(1), Some(2)];
        for _ in 0..50 {
            let mutated = mutate_centres(&problem, &current, &mut rng);
            assert_eq!(mutated[0], Some(0));
            assert!(mutated[1].is_some() && mutated[2].is_some());
            assert!(distinct(&mutated));
        }
    }

    #[test]
    fn mutation_moves_cleared_centres_elsewhere() {
        let problem = problem(3, vec![Cluster::new("a", 1.0)]);
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        for _ in 0..50 {
            let mutated = mutate_centres(&problem, &[Some(0)], &mut rng);
            assert!(matches!(mutated[0], Some(1) | Some(2)));
        }
    }

    #[test]
    fn mutation_reuses_cleared_centre_when_nothing_else_is_free() {
        let problem = problem(2, vec![Cluster::new("a", 1.0), Cluster::new("b", 1.0)]);
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        for _ in 0..20 {
            let mutated = mutate_centres(&problem, &[Some(0), Some(1)], &mut rng);
            assert!(mutated.iter().all(|c| c.is_some()));
            assert!(distinct(&mutated));
        }
    }

    #[test]
    fn same_seed_gives_same_centres() {
        let problem = problem(40, vec![Cluster::new("a", 1.0), Cluster::new("b", 1.0)]);
        let first = random_centres(&problem, &mut ChaCha8Rng::seed_from_u64(3));
        let second = random_centres(&problem, &mut ChaCha8Rng::seed_from_u64(3));
        assert_eq!(first, second);
    }
}
