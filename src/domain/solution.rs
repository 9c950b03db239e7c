use serde::Serialize;

use crate::evaluation::cost::Cost;
use crate::evaluation::evaluated_solution::EvaluatedSolution;

/// One cluster of a reported solution, in external ids.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterSolution {
    pub id: String,
    pub centre: Option<String>,
    pub members: Vec<String>,
    pub quantity: f64,
    pub cost: Cost,
}

/// Solver result detached from the problem's internal indices.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Solution {
    pub clusters: Vec<ClusterSolution>,
    pub unassigned: Vec<String>,
    pub cost: Cost,
}

impl Solution {
    pub fn cluster(&self, id: &str) -> Option<&ClusterSolution> {
        self.clusters.iter().find(|c| c.id == id)
    }

    /// Id of the cluster holding the location, if assigned.
    pub fn cluster_of(&self, location: &str) -> Option<&str> {
        self.clusters
            .iter()
            .find(|c| c.members.iter().any(|m| m == location))
            .map(|c| c.id.as_str())
    }
}

impl From<&EvaluatedSolution<'_>> for Solution {
    fn from(solution: &EvaluatedSolution<'_>) -> Self {
        let problem = solution.problem();
        let clusters = (0..problem.cluster_count())
            .map(|cluster| {
                let mut members: Vec<String> = solution
                    .members(cluster)
                    .iter()
                    .map(|&m| problem.location_id(m).to_string())
                    .collect();
                members.sort();
                ClusterSolution {
                    id: problem.cluster_id(cluster).to_string(),
                    centre: solution
                        .centre(cluster)
                        .map(|c| problem.location_id(c).to_string()),
                    members,
                    quantity: solution.cluster_quantity(cluster),
                    cost: solution.cluster_cost(cluster),
                }
            })
            .collect();

        Self {
            clusters,
            unassigned: solution
                .unassigned()
                .map(|c| problem.location_id(c).to_string())
                .collect(),
            cost: solution.cost(),
        }
    }
}
