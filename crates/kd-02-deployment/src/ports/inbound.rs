//! Inbound Ports (Driving Ports / API)

use crate::application::orchestrator::CancellationSignal;
use crate::domain::report::DeploymentReport;
use async_trait::async_trait;
use shared_types::Config;
use std::collections::BTreeMap;

/// Primary Deployment API
#[async_trait]
pub trait DeploymentApi: Send + Sync {
    /// Deploy one environment's configs.
    ///
    /// This is the main entry point. It:
    /// 1. Rejects duplicate identifiers before anything is deployed
    /// 2. Inserts ordering hints
    /// 3. Plans components with the dependency graph subsystem
    /// 4. Deploys components concurrently, configs sequentially
    /// 5. Returns the report; it never aborts on a single failure
    async fn deploy_environment(
        &self,
        environment: &str,
        configs: Vec<Config>,
        cancel: &CancellationSignal,
    ) -> DeploymentReport;

    /// Deploy several environments one after the other, each with its own
    /// entity map.
    async fn deploy_environments(
        &self,
        environments: BTreeMap<String, Vec<Config>>,
        cancel: &CancellationSignal,
    ) -> Vec<DeploymentReport>;
}
