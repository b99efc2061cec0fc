//! Dependency Graph Service
//!
//! Main service implementing DependencyGraphApi.

use crate::algorithms::{build_dependency_graph, kahns_topological_sort, split_components};
use crate::config::GraphConfig;
use crate::domain::entities::{
    DependencyGraph, DeploymentPlan, GraphComponent, RejectedComponent, SortedComponent,
};
use crate::domain::errors::GraphError;
use crate::ports::inbound::DependencyGraphApi;
use shared_types::Config;

use tracing::{debug, info, warn};

/// Dependency Graph Service
///
/// Orchestrates the planning pipeline:
/// 1. Validate input size
/// 2. Build dependency graph (incl. implicit references)
/// 3. Check edge limit
/// 4. Split into components
/// 5. Sort every component, rejecting cyclic ones
#[derive(Debug, Clone)]
pub struct DependencyGraphService {
    config: GraphConfig,
}

impl DependencyGraphService {
    /// Create a new service with default config
    pub fn new() -> Self {
        Self {
            config: GraphConfig::default(),
        }
    }

    /// Create a new service with custom config
    pub fn with_config(config: GraphConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }
}

impl Default for DependencyGraphService {
    fn default() -> Self {
        Self::new()
    }
}

impl DependencyGraphApi for DependencyGraphService {
    fn build(&self, configs: Vec<Config>) -> Result<(DependencyGraph, Vec<GraphError>), GraphError> {
        // 1. Validate input
        if configs.len() > self.config.max_configs {
            return Err(GraphError::TooManyConfigs {
                count: configs.len(),
                max: self.config.max_configs,
            });
        }

        // 2. Build dependency graph
        let (graph, errors) = build_dependency_graph(configs, &self.config);

        // 3. Validate edge count
        if graph.edge_count() > self.config.max_edge_count {
            return Err(GraphError::TooManyEdges {
                count: graph.edge_count(),
                max: self.config.max_edge_count,
            });
        }

        for error in &errors {
            warn!(error = %error, "Config problem found while building graph");
        }
        debug!(
            configs = graph.node_count(),
            edges = graph.edge_count(),
            "Dependency graph built"
        );

        Ok((graph, errors))
    }

    fn split(&self, graph: DependencyGraph) -> Vec<GraphComponent> {
        split_components(graph)
    }

    fn sort(&self, component: &GraphComponent) -> Result<SortedComponent, GraphError> {
        kahns_topological_sort(component)
    }

    fn plan(&self, configs: Vec<Config>) -> Result<DeploymentPlan, GraphError> {
        let config_count = configs.len();
        let (graph, errors) = self.build(configs)?;
        let components = self.split(graph);

        let mut plan = DeploymentPlan {
            errors,
            ..Default::default()
        };

        for component in &components {
            match self.sort(component) {
                Ok(sorted) => plan.components.push(sorted),
                Err(error) => {
                    warn!(
                        component_id = component.id,
                        error = %error,
                        "Rejecting component"
                    );
                    plan.rejected.push(RejectedComponent {
                        id: component.id,
                        coordinates: component.coordinates(),
                        error,
                    });
                }
            }
        }

        info!(
            configs = config_count,
            components = plan.components.len(),
            rejected = plan.rejected.len(),
            "Deployment plan complete"
        );

        Ok(plan)
    }
}
