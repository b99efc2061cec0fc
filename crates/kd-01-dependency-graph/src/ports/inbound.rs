//! Inbound Ports (Driving Ports / API)

use crate::domain::entities::{DependencyGraph, DeploymentPlan, GraphComponent, SortedComponent};
use crate::domain::errors::GraphError;
use shared_types::Config;

/// Primary Dependency Graph API
pub trait DependencyGraphApi: Send + Sync {
    /// Build the dependency graph of one environment's configs.
    ///
    /// Per-config problems are returned next to the graph. Only limit
    /// violations fail the whole build.
    fn build(&self, configs: Vec<Config>) -> Result<(DependencyGraph, Vec<GraphError>), GraphError>;

    /// Partition the graph into weakly-connected components.
    fn split(&self, graph: DependencyGraph) -> Vec<GraphComponent>;

    /// Order one component so that dependencies precede dependents.
    fn sort(&self, component: &GraphComponent) -> Result<SortedComponent, GraphError>;

    /// Build, split and sort in one go.
    ///
    /// This is the main entry point. A cyclic component is moved to
    /// `DeploymentPlan::rejected`; its siblings are unaffected.
    fn plan(&self, configs: Vec<Config>) -> Result<DeploymentPlan, GraphError>;
}
