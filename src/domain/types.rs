use serde::{Deserialize, Serialize};

/// A weighted location to be clustered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub id: String,
    pub quantity: f64,
    #[serde(default = "default_cost_per_unit_travel")]
    pub cost_per_unit_travel: f64,
}

impl Location {
    pub fn new(id: impl Into<String>, quantity: f64) -> Self {
        Self {
            id: id.into(),
            quantity,
            cost_per_unit_travel: default_cost_per_unit_travel(),
        }
    }

    pub fn with_cost_per_unit_travel(mut self, cost_per_unit_travel: f64) -> Self {
        self.cost_per_unit_travel = cost_per_unit_travel;
        self
    }
}

fn default_cost_per_unit_travel() -> f64 {
    1.0
}

/// A cluster slot, optionally pinned to a location which then is its centre.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    pub id: String,
    pub capacity: f64,
    #[serde(default)]
    pub fixed_location: Option<String>,
}

impl Cluster {
    pub fn new(id: impl Into<String>, capacity: f64) -> Self {
        Self {
            id: id.into(),
            capacity,
            fixed_location: None,
        }
    }

    pub fn fixed_to(mut self, location: impl Into<String>) -> Self {
        self.fixed_location = Some(location.into());
        self
    }
}

/// Directed travel cost between two locations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TravelEdge {
    pub from: String,
    pub to: String,
    pub cost: f64,
}

impl TravelEdge {
    pub fn new(from: impl Into<String>, to: impl Into<String>, cost: f64) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            cost,
        }
    }
}
