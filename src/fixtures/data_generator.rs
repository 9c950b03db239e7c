use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::info;

use crate::domain::problem::Problem;
use crate::domain::types::{Cluster, Location, TravelEdge};
use crate::error::Result;
use crate::utils::euclidean;

// Total capacity is this much above total demand.
const CAPACITY_SLACK: f64 = 1.2;
const GRID_SIZE: f64 = 100.0;

/// Generates a seeded random instance: uniform points on a square,
/// integer quantities in 1..=10, Euclidean travel and equal capacities.
pub fn generate_random_problem(locations: usize, clusters: usize, seed: u64) -> Result<Problem> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    let points: Vec<(f64, f64)> = (0..locations)
        .map(|_| (rng.gen_range(0.0..GRID_SIZE), rng.gen_range(0.0..GRID_SIZE)))
        .collect();
    let quantities: Vec<f64> = (0..locations).map(|_| rng.gen_range(1..=10) as f64).collect();

    let total: f64 = quantities.iter().sum();
    let capacity = (CAPACITY_SLACK * total / clusters.max(1) as f64).ceil();
    info!(
        "Generated {} random locations (total quantity {}) for {} clusters of capacity {}",
        locations, total, clusters, capacity
    );

    let ids: Vec<String> = (0..locations).map(|i| format!("loc{i:04}")).collect();
    let mut edges = Vec::with_capacity(locations * locations);
    for (i, a) in points.iter().enumerate() {
        for (j, b) in points.iter().enumerate() {
            if i != j {
                edges.push(TravelEdge::new(ids[i].clone(), ids[j].clone(), euclidean(*a, *b)));
            }
        }
    }

    Problem::new(
        ids.iter().zip(quantities).map(|(id, q)| Location::new(id.clone(), q)),
        (0..clusters).map(|c| Cluster::new(format!("cluster{c}"), capacity)),
        edges,
    )
}
