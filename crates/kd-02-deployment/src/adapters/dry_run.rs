//! Dry-run adapter
//!
//! Performs no remote call. Resolution and rendering still run in full, so a
//! dry run validates references, environment variables and templates.

use crate::domain::errors::ApiError;
use crate::ports::outbound::{DeployApi, DeployContext};
use async_trait::async_trait;
use shared_types::{Config, Properties, ResolvedEntity, ID_PROPERTY, NAME_PARAMETER};
use tracing::debug;
use uuid::Uuid;

/// Adapter that pretends every deploy succeeded.
///
/// The entity id is the config's origin object id when it has one, a fresh
/// UUID v4 otherwise.
#[derive(Debug, Clone, Copy, Default)]
pub struct DryRunDeployApi;

#[async_trait]
impl DeployApi for DryRunDeployApi {
    async fn deploy(
        &self,
        ctx: &DeployContext,
        properties: &Properties,
        rendered: &str,
        config: &Config,
    ) -> Result<ResolvedEntity, ApiError> {
        let id = config
            .origin_object_id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let name = properties
            .get(NAME_PARAMETER)
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();

        debug!(
            coordinate = %config.coordinate,
            environment = %ctx.environment,
            payload_bytes = rendered.len(),
            "Dry run, not deploying"
        );

        Ok(
            ResolvedEntity::new(config.coordinate.clone(), name, properties.clone())
                .with_property(ID_PROPERTY, id),
        )
    }
}
