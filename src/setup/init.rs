use std::error::Error;
use std::fs::File;
use std::io::Read;

use csv::{ReaderBuilder, Trim};
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::domain::problem::Problem;
use crate::domain::types::{Cluster, Location, TravelEdge};
use crate::setup::init_types::{ClusterRow, LocationRow, TravelRow};
use crate::utils::euclidean;

/// Loads a problem from CSV files. Without a travel file, travel is the
/// Euclidean distance between the `x,y` coordinates of the locations.
pub fn load_problem(
    locations_path: &str,
    clusters_path: &str,
    travel_path: Option<&str>,
) -> Result<Problem, Box<dyn Error>> {
    info!(
        "Loading locations from {} and clusters from {}",
        locations_path, clusters_path
    );
    let locations = read_rows(File::open(locations_path)?)?;
    let clusters = read_rows(File::open(clusters_path)?)?;
    let travel = match travel_path {
        Some(path) => {
            info!("Loading travel costs from {}", path);
            Some(read_rows(File::open(path)?)?)
        }
        None => None,
    };
    build_problem(locations, clusters, travel)
}

/// Assembles a problem from parsed rows.
pub fn build_problem(
    locations: Vec<LocationRow>,
    clusters: Vec<ClusterRow>,
    travel: Option<Vec<TravelRow>>,
) -> Result<Problem, Box<dyn Error>> {
    let edges: Vec<TravelEdge> = match travel {
        Some(rows) => rows.into_iter().map(TravelEdge::from).collect(),
        None => {
            debug!("No travel file given, using Euclidean distances");
            euclidean_edges(&locations)?
        }
    };
    let clusters: Vec<Cluster> = clusters.into_iter().map(Cluster::from).collect();
    if clusters.iter().any(|cluster| cluster.capacity.is_infinite()) {
        warn!("Some clusters have no capacity column value, treating them as unlimited");
    }

    let problem = Problem::new(
        locations.iter().map(Location::from),
        clusters,
        edges,
    )?;
    info!(
        "Loaded {} locations, {} clusters",
        problem.location_count(),
        problem.cluster_count()
    );
    Ok(problem)
}

/// Reads every record of a headed CSV, trimming whitespace around fields.
pub fn read_rows<T, R>(reader: R) -> Result<Vec<T>, Box<dyn Error>>
where
    T: DeserializeOwned,
    R: Read,
{
    let mut reader = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .from_reader(reader);
    let mut rows = Vec::new();
    for record in reader.deserialize() {
        rows.push(record?);
    }
    Ok(rows)
}

fn euclidean_edges(locations: &[LocationRow]) -> Result<Vec<TravelEdge>, Box<dyn Error>> {
    let points = locations
        .iter()
        .map(|row| {
            row.coordinates().ok_or_else(|| {
                format!(
                    "location {} has no x,y coordinates and no travel file was given",
                    row.id
                )
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut edges = Vec::with_capacity(points.len() * points.len());
    for (from, a) in locations.iter().zip(&points) {
        for (to, b) in locations.iter().zip(&points) {
            if from.id != to.id {
                edges.push(TravelEdge::new(from.id.clone(), to.id.clone(), euclidean(*a, *b)));
            }
        }
    }
    Ok(edges)
}
