//! Outbound Ports (Driven Ports / SPI)

use crate::domain::errors::ApiError;
use crate::domain::report::{DeploymentEvent, DeploymentSummary};
use async_trait::async_trait;
use shared_types::{Config, Properties, ResolvedEntity};
use std::time::Duration;

/// Context handed to every deploy call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployContext {
    /// Environment being deployed
    pub environment: String,
    /// Component the config belongs to
    pub component_id: usize,
    /// Deadline applied to the call by the orchestrator
    pub call_timeout: Duration,
}

/// Per-resource-type deploy adapter
///
/// Each adapter owns the shape of its remote calls; the orchestrator only
/// relies on this signature and on the error classification of [`ApiError`].
#[async_trait]
pub trait DeployApi: Send + Sync {
    /// Create or update the remote object for `config`.
    ///
    /// `properties` are the resolved parameter values and `rendered` the
    /// template with every placeholder substituted.
    async fn deploy(
        &self,
        ctx: &DeployContext,
        properties: &Properties,
        rendered: &str,
        config: &Config,
    ) -> Result<ResolvedEntity, ApiError>;
}

/// Sink for deployment events
pub trait Reporter: Send + Sync {
    /// Called once per config as soon as its outcome is known.
    fn report(&self, event: &DeploymentEvent);

    /// Called once per environment after the last event.
    fn finish(&self, _environment: &str, _summary: &DeploymentSummary) {}
}

/// Source of environment variable values for parameter resolution
pub trait EnvironmentLookup: Send + Sync {
    fn var(&self, name: &str) -> Option<String>;
}
