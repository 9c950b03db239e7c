use std::collections::HashMap;

use tracing::{debug, warn};

use crate::config::constant::UNREACHABLE_MULTIPLIER;
use crate::domain::types::{Cluster, Location, TravelEdge};
use crate::error::{Error, Result};
use crate::utils::standardise;

/// Immutable clustering problem with dense location and cluster indices.
#[derive(Debug, Clone)]
pub struct Problem {
    location_ids: Vec<String>,
    location_index: HashMap<String, usize>,
    quantities: Vec<f64>,
    costs_per_unit_travel: Vec<f64>,
    cluster_ids: Vec<String>,
    capacities: Vec<f64>,
    fixed_locations: Vec<Option<usize>>,
    fixed_clusters: Vec<Option<usize>>,
    // row-major, locations x locations
    travel: Vec<f64>,
}

impl Problem {
    /// Builds the problem, resolving external ids to dense indices.
    ///
    /// Travel edges with unknown endpoints are skipped, missing edges cost zero
    /// and non-finite (or `f64::MAX`) costs become a large finite penalty.
    pub fn new<L, C, T>(locations: L, clusters: C, travel: T) -> Result<Self>
    where
        L: IntoIterator<Item = Location>,
        C: IntoIterator<Item = Cluster>,
        T: IntoIterator<Item = TravelEdge>,
    {
        let mut location_ids = Vec::new();
        let mut location_index = HashMap::new();
        let mut quantities = Vec::new();
        let mut costs_per_unit_travel = Vec::new();

        for (index, location) in locations.into_iter().enumerate() {
            let key = standardise(&location.id);
            if key.is_empty() {
                return Err(Error::MissingLocationId { index });
            }
            if location_index.insert(key, index).is_some() {
                return Err(Error::DuplicateLocationId(location.id));
            }
            location_ids.push(location.id.trim().to_string());
            quantities.push(location.quantity);
            costs_per_unit_travel.push(location.cost_per_unit_travel);
        }

        let n = location_ids.len();
        let mut cluster_ids: Vec<String> = Vec::new();
        let mut capacities = Vec::new();
        let mut fixed_locations = Vec::new();
        let mut fixed_clusters: Vec<Option<usize>> = vec![None; n];

        for (cluster_index, cluster) in clusters.into_iter().enumerate() {
            let fixed = match cluster.fixed_location.as_deref().map(standardise) {
                Some(key) if !key.is_empty() => {
                    let location = *location_index.get(&key).ok_or_else(|| {
                        Error::UnknownFixedLocation {
                            cluster: cluster.id.clone(),
                            location: key.clone(),
                        }
                    })?;
                    if let Some(first) = fixed_clusters[location] {
                        return Err(Error::LocationAlreadyClaimed {
                            location: location_ids[location].clone(),
                            first: cluster_ids[first].clone(),
                            second: cluster.id,
                        });
                    }
                    fixed_clusters[location] = Some(cluster_index);
                    Some(location)
                }
                _ => None,
            };
            cluster_ids.push(cluster.id);
            capacities.push(cluster.capacity);
            fixed_locations.push(fixed);
        }

        let mut matrix = vec![0.0; n * n];
        let mut unreachable = Vec::new();
        let mut max_finite: f64 = 0.0;
        let mut skipped = 0usize;

        for edge in travel {
            let from = location_index.get(&standardise(&edge.from));
            let to = location_index.get(&standardise(&edge.to));
            let (Some(&from), Some(&to)) = (from, to) else {
                skipped += 1;
                continue;
            };
            if edge.cost.is_finite() && edge.cost != f64::MAX {
                matrix[from * n + to] = edge.cost;
                max_finite = max_finite.max(edge.cost);
            } else {
                unreachable.push(from * n + to);
            }
        }

        if skipped > 0 {
            debug!("Skipped {} travel edges with unknown endpoints", skipped);
        }
        if !unreachable.is_empty() {
            let penalty = if max_finite > 0.0 {
                max_finite * UNREACHABLE_MULTIPLIER
            } else {
                UNREACHABLE_MULTIPLIER
            };
            warn!(
                "{} travel edges are unreachable, using penalty cost {}",
                unreachable.len(),
                penalty
            );
            for cell in unreachable {
                matrix[cell] = penalty;
            }
        }

        Ok(Self {
            location_ids,
            location_index,
            quantities,
            costs_per_unit_travel,
            cluster_ids,
            capacities,
            fixed_locations,
            fixed_clusters,
            travel: matrix,
        })
    }

    pub fn location_count(&self) -> usize {
        self.location_ids.len()
    }

    pub fn cluster_count(&self) -> usize {
        self.cluster_ids.len()
    }

    pub fn location_id(&self, location: usize) -> &str {
        &self.location_ids[location]
    }

    pub fn cluster_id(&self, cluster: usize) -> &str {
        &self.cluster_ids[cluster]
    }

    /// Looks a location up by its external id (standardised before lookup).
    pub fn location_index(&self, id: &str) -> Option<usize> {
        self.location_index.get(&standardise(id)).copied()
    }

    pub fn cluster_index(&self, id: &str) -> Option<usize> {
        let key = standardise(id);
        self.cluster_ids.iter().position(|c| standardise(c) == key)
    }

    pub fn quantity(&self, location: usize) -> f64 {
        self.quantities[location]
    }

    pub fn cost_per_unit_travel(&self, location: usize) -> f64 {
        self.costs_per_unit_travel[location]
    }

    pub fn capacity(&self, cluster: usize) -> f64 {
        self.capacities[cluster]
    }

    pub fn travel(&self, from: usize, to: usize) -> f64 {
        self.travel[from * self.location_ids.len() + to]
    }

    /// Location the cluster is pinned to, if any.
    pub fn fixed_location(&self, cluster: usize) -> Option<usize> {
        self.fixed_locations[cluster]
    }

    /// Cluster pinned to the location, if any.
    pub fn fixed_cluster(&self, location: usize) -> Option<usize> {
        self.fixed_clusters[location]
    }
}
