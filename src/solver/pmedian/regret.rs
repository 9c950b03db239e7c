use std::cmp::Ordering;

use crate::error::{InvariantViolation, Result};
use crate::evaluation::cost::Cost;

/// Gap between an unassigned customer's best and second-best cluster.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Regret {
    pub customer: usize,
    pub best: Option<usize>,
    pub second: Option<usize>,
    pub value: Cost,
}

impl Regret {
    /// Builds the regret from the customer's cost per cluster.
    /// Clusters costing [`Cost::max`] are unavailable and never ranked.
    pub fn new(customer: usize, costs: &[Cost]) -> Result<Self> {
        if costs.len() < 2 {
            return Err(InvariantViolation::TooFewCandidates(costs.len()).into());
        }

        let mut best: Option<usize> = None;
        let mut second: Option<usize> = None;
        for (cluster, cost) in costs.iter().enumerate() {
            if cost.is_max() {
                continue;
            }
            match best {
                Some(b) if cost.compare(&costs[b]) != Ordering::Less => {
                    if second.map_or(true, |s| cost.compare(&costs[s]) == Ordering::Less) {
                        second = Some(cluster);
                    }
                }
                _ => {
                    second = best;
                    best = Some(cluster);
                }
            }
        }

        let value = match (best, second) {
            (Some(b), Some(s)) => costs[s] - costs[b],
            // a single option must be taken before it fills up
            (Some(_), None) => Cost::max(),
            _ => Cost::zero(),
        };

        Ok(Self {
            customer,
            best,
            second,
            value,
        })
    }

    /// Whether a changed cost for `cluster` could reorder the best two.
    pub fn affected_by(&self, cluster: usize, updated: &Cost, costs: &[Cost]) -> bool {
        if self.best == Some(cluster) || self.second == Some(cluster) {
            return true;
        }
        match self.second {
            Some(second) => updated.compare(&costs[second]) == Ordering::Less,
            None => !updated.is_max(),
        }
    }
}

/// Priority queue entry: highest regret first, lower customer id on ties.
/// `version` lets stale entries be skipped instead of removed.
#[derive(Debug, Clone, Copy)]
pub struct QueuedRegret {
    pub regret: Regret,
    pub version: u32,
}

impl PartialEq for QueuedRegret {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for QueuedRegret {}

impl Ord for QueuedRegret {
    fn cmp(&self, other: &Self) -> Ordering {
        self.regret
            .value
            .compare(&other.regret.value)
            .then_with(|| other.regret.customer.cmp(&self.regret.customer))
            .then_with(|| self.version.cmp(&other.version))
    }
}

impl PartialOrd for QueuedRegret {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
