//! # KD-02: Deployment Subsystem
//!
//! Deploys the sorted components produced by the dependency graph subsystem.
//! Every config's parameters are resolved against the [`EntityMap`] of
//! already deployed configs, its template is rendered and the adapter
//! registered for its resource type performs the remote call.
//!
//! ## Architecture
//!
//! - **Domain**: EntityMap, deployment events and reports, errors
//! - **Algorithms**: fixed-wait retry policy
//! - **Ports**: Inbound (DeploymentApi), Outbound (DeployApi, Reporter, EnvironmentLookup)
//! - **Application**: ParameterResolver, Orchestrator, DeploymentService
//! - **Adapters**: adapter registry, dry run, retrying decorator, reporters, environments
//!
//! ## Failure isolation
//!
//! ```text
//! component 0:  A ──► B ──► C        B fails: C is skipped, A stays deployed
//! component 1:  D ──► E              unaffected, deployed concurrently
//! ```

pub mod adapters;
pub mod algorithms;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

pub use adapters::{
    AdapterRegistry, DryRunDeployApi, MemoryReporter, ProcessEnvironment, RetryingDeployApi,
    StaticEnvironment, TracingReporter,
};
pub use algorithms::retry::{
    send_with_retries, RetrySetting, RetrySettings, RetryTier, RETRYABLE_STATUS_CODES,
};
pub use application::orchestrator::{CancellationSignal, DeploymentOutcome, Orchestrator};
pub use application::resolver::{
    insert_ordering_hints, validate_unique_identifiers, ParameterResolver, Resolution,
};
pub use application::service::DeploymentService;
pub use config::DeploymentConfig;
pub use domain::entity_map::EntityMap;
pub use domain::errors::{ApiError, DeploymentError};
pub use domain::report::{DeploymentEvent, DeploymentReport, DeploymentState, DeploymentSummary};
pub use ports::inbound::DeploymentApi;
pub use ports::outbound::{DeployApi, DeployContext, EnvironmentLookup, Reporter};
