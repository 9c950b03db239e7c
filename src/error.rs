use thiserror::Error;

/// Errors returned while building a problem or an evaluated solution.
///
/// Everything except [`Error::Invariant`] is a construction error: the input is
/// malformed and the caller has to fix it.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// A location id was empty after standardisation.
    #[error("location at position {index} has no id")]
    MissingLocationId { index: usize },

    /// Two locations standardise to the same id.
    #[error("duplicate location id '{0}'")]
    DuplicateLocationId(String),

    /// A fixed cluster refers to a location that does not exist.
    #[error("cluster '{cluster}' is fixed to unknown location '{location}'")]
    UnknownFixedLocation { cluster: String, location: String },

    /// Two clusters are fixed to the same location.
    #[error("location '{location}' is fixed to both cluster '{first}' and cluster '{second}'")]
    LocationAlreadyClaimed {
        location: String,
        first: String,
        second: String,
    },

    /// The centre array does not have one entry per cluster.
    #[error("expected {expected} centres, found {found}")]
    CentreCountMismatch { expected: usize, found: usize },

    /// A centre index does not name a location of the problem.
    #[error("cluster {cluster} is centred on unknown location index {customer}")]
    UnknownCentre { cluster: usize, customer: usize },

    /// A customer was used as the centre of more than one cluster.
    #[error("customer {0} is already assigned")]
    CustomerAlreadyAssigned(usize),

    /// A cluster with a fixed location was seeded with a different centre,
    /// or a fixed location was seeded as another cluster's centre.
    #[error("cluster {cluster} must be centred on its fixed location")]
    FixedCentreMismatch { cluster: usize },

    #[error(transparent)]
    Invariant(#[from] InvariantViolation),
}

impl Error {
    pub fn is_construction(&self) -> bool {
        !matches!(self, Error::Invariant(_))
    }
}

/// Internal consistency failures. These indicate a bug and abort the run.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvariantViolation {
    #[error("customer {customer} is not a member of cluster {cluster}")]
    CustomerNotInCluster { customer: usize, cluster: usize },

    #[error("cannot move pinned centre {customer} out of cluster {cluster}")]
    PinnedCentreMoved { customer: usize, cluster: usize },

    #[error("cluster {cluster} is inconsistent: {reason}")]
    InconsistentCluster { cluster: usize, reason: &'static str },

    #[error("regret needs at least two candidate clusters, found {0}")]
    TooFewCandidates(usize),

    #[error("customer {0} is unassigned")]
    UnassignedCustomer(usize),
}

/// Result type used by this crate.
pub type Result<T> = std::result::Result<T, Error>;
