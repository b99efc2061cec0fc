//! Configuration for the Dependency Graph Subsystem

use serde::{Deserialize, Serialize};

/// Graph building configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GraphConfig {
    /// Maximum configs accepted for one environment
    pub max_configs: usize,
    /// Maximum edges in the dependency graph
    pub max_edge_count: usize,
    /// Scan template content for literal ids of other configs
    pub implicit_references: bool,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            max_configs: 10_000,
            max_edge_count: 100_000,
            implicit_references: true,
        }
    }
}
