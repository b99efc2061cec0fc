//! Retrying decorator
//!
//! Wraps any [`DeployApi`] with the shared retry policy. The tier is chosen
//! per resource type and every attempt gets its own `ctx.call_timeout`.

use crate::algorithms::retry::{send_with_retries, RetrySettings, RetryTier};
use crate::domain::errors::ApiError;
use crate::ports::outbound::{DeployApi, DeployContext};
use async_trait::async_trait;
use keel_telemetry::DeploymentMetrics;
use shared_types::{Config, Properties, ResolvedEntity};
use std::sync::Arc;
use tracing::debug;

/// Applies [`RetrySettings`] to every call of the wrapped adapter.
pub struct RetryingDeployApi {
    inner: Arc<dyn DeployApi>,
    settings: RetrySettings,
    metrics: Option<DeploymentMetrics>,
}

impl RetryingDeployApi {
    pub fn new(inner: Arc<dyn DeployApi>, settings: RetrySettings) -> Self {
        Self {
            inner,
            settings,
            metrics: None,
        }
    }

    /// Count retries in `metrics`.
    pub fn with_metrics(mut self, metrics: DeploymentMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }
}

#[async_trait]
impl DeployApi for RetryingDeployApi {
    async fn deploy(
        &self,
        ctx: &DeployContext,
        properties: &Properties,
        rendered: &str,
        config: &Config,
    ) -> Result<ResolvedEntity, ApiError> {
        let tier = RetryTier::for_resource(&config.resource_type);
        let setting = self.settings.get(tier);
        let inner = &self.inner;
        let metrics = &self.metrics;

        send_with_retries(
            setting,
            move || async move {
                tokio::time::timeout(ctx.call_timeout, inner.deploy(ctx, properties, rendered, config))
                    .await
                    .unwrap_or_else(|_| Err(ApiError::Timeout(ctx.call_timeout)))
            },
            |attempt, _| {
                debug!(coordinate = %config.coordinate, ?tier, attempt, "Retrying deploy call");
                if let Some(metrics) = metrics {
                    metrics.record_retry();
                }
            },
        )
        .await
    }
}
