//! Error types for the Deployment subsystem

use crate::algorithms::retry::RETRYABLE_STATUS_CODES;
use kd_01_dependency_graph::GraphError;
use shared_types::{AdapterKind, Coordinate};
use std::time::Duration;
use thiserror::Error;

/// Errors returned by deploy adapters
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApiError {
    /// Rate limiting or a temporarily unavailable upstream
    #[error("Transient API error (HTTP {status}): {message}")]
    Transient { status: u16, message: String },

    /// Any other non-success response
    #[error("API error (HTTP {status}): {message}")]
    Permanent { status: u16, message: String },

    /// The platform rejected the payload
    #[error("Payload rejected: {0}")]
    Validation(String),

    /// Connection failed before a response arrived
    #[error("Network error: {0}")]
    Network(String),

    /// No response within the call timeout
    #[error("Call timed out after {0:?}")]
    Timeout(Duration),

    #[error("Giving up after {attempts} attempts: {last}")]
    RetriesExhausted { attempts: u32, last: Box<ApiError> },
}

impl ApiError {
    /// Classify an HTTP error response.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        if RETRYABLE_STATUS_CODES.contains(&status) {
            ApiError::Transient { status, message }
        } else {
            ApiError::Permanent { status, message }
        }
    }

    /// Whether re-issuing the same call may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ApiError::Transient { .. } | ApiError::Network(_) | ApiError::Timeout(_)
        )
    }

    /// HTTP status of the (last) response, if there was one.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Transient { status, .. } | ApiError::Permanent { status, .. } => Some(*status),
            ApiError::RetriesExhausted { last, .. } => last.status(),
            _ => None,
        }
    }
}

/// All errors that can occur while deploying an environment
#[derive(Debug, Clone, Error)]
pub enum DeploymentError {
    /// Malformed template or parameter; local to one config
    #[error("Invalid config {coordinate}: {message}")]
    Validation { coordinate: Coordinate, message: String },

    /// Cycle inside a component; none of its configs deploy
    #[error("Component {component_id} has a cyclic dependency between {}", join(.coordinates))]
    CyclicDependency {
        component_id: usize,
        coordinates: Vec<Coordinate>,
    },

    #[error("Config {coordinate}: environment variable '{variable}' of parameter '{parameter}' is not set")]
    MissingEnvVar {
        coordinate: Coordinate,
        parameter: String,
        variable: String,
    },

    /// The referenced config has not been deployed
    #[error("Config {coordinate} references {dependency}, which has not been deployed")]
    UnresolvedDependency {
        coordinate: Coordinate,
        dependency: Coordinate,
    },

    #[error("Config {coordinate} references property '{property}' of {dependency}, which does not exist")]
    UnresolvedProperty {
        coordinate: Coordinate,
        dependency: Coordinate,
        property: String,
    },

    #[error("Deploying {coordinate} failed: {source}")]
    Api {
        coordinate: Coordinate,
        #[source]
        source: ApiError,
    },

    /// Two configs collide on an identifier; fatal to the environment
    #[error("Configs {first} and {second} share {identifier}")]
    DuplicateIdentifier {
        first: Coordinate,
        second: Coordinate,
        identifier: String,
    },

    /// The adapter panicked while deploying the config
    #[error("Deploy adapter panicked on {coordinate}: {message}")]
    AdapterPanicked { coordinate: Coordinate, message: String },

    #[error("No deploy adapter registered for {kind} (config {coordinate})")]
    MissingAdapter {
        coordinate: Coordinate,
        kind: AdapterKind,
    },

    #[error("Config {coordinate} not deployed: dependency {dependency} failed")]
    FailedDependency {
        coordinate: Coordinate,
        dependency: Coordinate,
    },

    #[error("Config {coordinate} not deployed: deployment cancelled")]
    Cancelled { coordinate: Coordinate },

    /// Found while building the graph. Limit violations are fatal to the
    /// environment, the rest belong to one config.
    #[error(transparent)]
    Graph(#[from] GraphError),
}

impl DeploymentError {
    /// The config this error belongs to, if it is local to one config.
    pub fn coordinate(&self) -> Option<&Coordinate> {
        match self {
            DeploymentError::Validation { coordinate, .. }
            | DeploymentError::MissingEnvVar { coordinate, .. }
            | DeploymentError::UnresolvedDependency { coordinate, .. }
            | DeploymentError::UnresolvedProperty { coordinate, .. }
            | DeploymentError::Api { coordinate, .. }
            | DeploymentError::MissingAdapter { coordinate, .. }
            | DeploymentError::AdapterPanicked { coordinate, .. }
            | DeploymentError::FailedDependency { coordinate, .. }
            | DeploymentError::Cancelled { coordinate } => Some(coordinate),
            DeploymentError::DuplicateIdentifier { second, .. } => Some(second),
            DeploymentError::Graph(e) => e.coordinate(),
            DeploymentError::CyclicDependency { .. } => None,
        }
    }

    /// A dependency missing from the entity map means the sort order was
    /// violated. That is a bug, never a condition to retry.
    pub fn is_fatal_bug(&self) -> bool {
        matches!(self, DeploymentError::UnresolvedDependency { .. })
    }
}

fn join(coordinates: &[Coordinate]) -> String {
    coordinates
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
