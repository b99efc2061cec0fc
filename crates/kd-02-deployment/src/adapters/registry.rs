//! Adapter registry
//!
//! Maps each resource-type tag to the adapter that deploys it.

use super::dry_run::DryRunDeployApi;
use super::retrying::RetryingDeployApi;
use crate::algorithms::retry::RetrySettings;
use crate::ports::outbound::DeployApi;
use keel_telemetry::DeploymentMetrics;
use shared_types::AdapterKind;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Deploy adapters keyed by resource kind.
#[derive(Clone, Default)]
pub struct AdapterRegistry {
    adapters: HashMap<AdapterKind, Arc<dyn DeployApi>>,
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the dry-run adapter for every kind.
    pub fn dry_run() -> Self {
        let adapter: Arc<dyn DeployApi> = Arc::new(DryRunDeployApi);
        AdapterKind::ALL
            .into_iter()
            .fold(Self::new(), |registry, kind| {
                registry.with_adapter(kind, Arc::clone(&adapter))
            })
    }

    pub fn with_adapter(mut self, kind: AdapterKind, adapter: Arc<dyn DeployApi>) -> Self {
        self.register(kind, adapter);
        self
    }

    /// Register `adapter` for `kind`, replacing any previous one.
    pub fn register(&mut self, kind: AdapterKind, adapter: Arc<dyn DeployApi>) {
        self.adapters.insert(kind, adapter);
    }

    pub fn get(&self, kind: AdapterKind) -> Option<Arc<dyn DeployApi>> {
        self.adapters.get(&kind).cloned()
    }

    /// Wrap every adapter in a [`RetryingDeployApi`].
    pub fn with_retries(self, settings: RetrySettings, metrics: Option<DeploymentMetrics>) -> Self {
        let adapters = self
            .adapters
            .into_iter()
            .map(|(kind, inner)| {
                let mut retrying = RetryingDeployApi::new(inner, settings);
                if let Some(metrics) = &metrics {
                    retrying = retrying.with_metrics(metrics.clone());
                }
                (kind, Arc::new(retrying) as Arc<dyn DeployApi>)
            })
            .collect();
        Self { adapters }
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}

impl fmt::Debug for AdapterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds: Vec<_> = self.adapters.keys().collect();
        kinds.sort();
        f.debug_struct("AdapterRegistry").field("kinds", &kinds).finish()
    }
}
