//! Adapters for the Deployment subsystem
//!
//! - Adapter registry keyed by resource kind
//! - Dry-run and retrying deploy adapters
//! - Reporters and environment variable sources

pub mod dry_run;
pub mod environment;
pub mod registry;
pub mod reporter;
pub mod retrying;

pub use dry_run::DryRunDeployApi;
pub use environment::{ProcessEnvironment, StaticEnvironment};
pub use registry::AdapterRegistry;
pub use reporter::{MemoryReporter, TracingReporter};
pub use retrying::RetryingDeployApi;
