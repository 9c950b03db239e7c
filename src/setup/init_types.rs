use serde::Deserialize;

use crate::domain::types::{Cluster, Location, TravelEdge};

/// Row of the locations CSV: `id,quantity[,cost_per_unit_travel][,x,y]`.
#[derive(Debug, Deserialize)]
pub struct LocationRow {
    pub id: String,
    pub quantity: f64,
    #[serde(default)]
    pub cost_per_unit_travel: Option<f64>,
    #[serde(default)]
    pub x: Option<f64>,
    #[serde(default)]
    pub y: Option<f64>,
}

impl LocationRow {
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        self.x.zip(self.y)
    }
}

impl From<&LocationRow> for Location {
    fn from(row: &LocationRow) -> Self {
        let location = Location::new(row.id.clone(), row.quantity);
        match row.cost_per_unit_travel {
            Some(cost) => location.with_cost_per_unit_travel(cost),
            None => location,
        }
    }
}

/// Row of the clusters CSV: `id[,capacity][,fixed_location]`.
#[derive(Debug, Deserialize)]
pub struct ClusterRow {
    pub id: String,
    #[serde(default)]
    pub capacity: Option<f64>,
    #[serde(default)]
    pub fixed_location: Option<String>,
}

impl From<ClusterRow> for Cluster {
    fn from(row: ClusterRow) -> Self {
        let cluster = Cluster::new(row.id, row.capacity.unwrap_or(f64::INFINITY));
        match row.fixed_location.filter(|location| !location.trim().is_empty()) {
            Some(location) => cluster.fixed_to(location),
            None => cluster,
        }
    }
}

/// Row of the travel CSV: `from,to,cost`.
#[derive(Debug, Deserialize)]
pub struct TravelRow {
    pub from: String,
    pub to: String,
    pub cost: f64,
}

impl From<TravelRow> for TravelEdge {
    fn from(row: TravelRow) -> Self {
        TravelEdge::new(row.from, row.to, row.cost)
    }
}
