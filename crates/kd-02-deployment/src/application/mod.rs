//! Application layer for the Deployment subsystem

pub mod orchestrator;
pub mod resolver;
pub mod service;

pub use orchestrator::{CancellationSignal, DeploymentOutcome, Orchestrator};
pub use resolver::{insert_ordering_hints, validate_unique_identifiers, ParameterResolver, Resolution};
pub use service::DeploymentService;
