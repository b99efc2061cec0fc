//! Core entities for the Dependency Graph
//!
//! Nodes are configs kept in discovery order (the order the loader produced
//! them). Edges point from the config that must deploy first to the config
//! that references it.

use super::errors::GraphError;
use super::value_objects::DependencyKind;
use serde::{Deserialize, Serialize};
use shared_types::{Config, Coordinate};
use std::collections::HashMap;

/// Dependency graph edge
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    /// Config that must deploy first (the referenced one)
    pub from: Coordinate,
    /// Config that must deploy after (the referencing one)
    pub to: Coordinate,
    /// How the dependency was declared
    pub kind: DependencyKind,
}

impl Dependency {
    pub fn new(from: Coordinate, to: Coordinate, kind: DependencyKind) -> Self {
        Self { from, to, kind }
    }
}

/// Dependency graph over the configs of one environment
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    /// Configs in discovery order
    nodes: Vec<Config>,
    /// Coordinate -> position in `nodes`
    index: HashMap<Coordinate, usize>,
    /// All edges in insertion order
    edges: Vec<Dependency>,
    /// Adjacency list: from -> [to, to, ...]
    adjacency: Vec<Vec<usize>>,
    /// In-degree count for each node
    in_degree: Vec<usize>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a config node. Coordinates must be unique.
    pub fn add_node(&mut self, config: Config) -> Result<usize, GraphError> {
        if self.index.contains_key(&config.coordinate) {
            return Err(GraphError::DuplicateCoordinate {
                coordinate: config.coordinate,
            });
        }
        let idx = self.nodes.len();
        self.index.insert(config.coordinate.clone(), idx);
        self.nodes.push(config);
        self.adjacency.push(Vec::new());
        self.in_degree.push(0);
        Ok(idx)
    }

    /// Add a dependency edge.
    ///
    /// Returns `false` when either endpoint is unknown or the edge already
    /// exists; duplicate declarations of one dependency collapse into one edge.
    pub fn add_edge(&mut self, dep: Dependency) -> bool {
        let (Some(&from), Some(&to)) = (self.index.get(&dep.from), self.index.get(&dep.to)) else {
            return false;
        };
        if self.adjacency[from].contains(&to) {
            return false;
        }

        self.adjacency[from].push(to);
        self.in_degree[to] += 1;
        self.edges.push(dep);
        true
    }

    /// Check if an edge exists from -> to
    pub fn has_edge(&self, from: &Coordinate, to: &Coordinate) -> bool {
        match (self.index.get(from), self.index.get(to)) {
            (Some(&f), Some(&t)) => self.adjacency[f].contains(&t),
            _ => false,
        }
    }

    pub fn contains(&self, coordinate: &Coordinate) -> bool {
        self.index.contains_key(coordinate)
    }

    pub fn index_of(&self, coordinate: &Coordinate) -> Option<usize> {
        self.index.get(coordinate).copied()
    }

    /// Configs in discovery order
    pub fn configs(&self) -> &[Config] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Dependency] {
        &self.edges
    }

    /// Positions of the configs depending on the node at `idx`
    pub fn dependents(&self, idx: usize) -> &[usize] {
        &self.adjacency[idx]
    }

    pub fn in_degree(&self, idx: usize) -> usize {
        self.in_degree[idx]
    }

    /// Coordinates of every config the given config depends on
    pub fn dependencies_of(&self, coordinate: &Coordinate) -> Vec<&Coordinate> {
        self.edges
            .iter()
            .filter(|e| &e.to == coordinate)
            .map(|e| &e.from)
            .collect()
    }

    /// Number of nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of edges
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Consume the graph into its configs and edges.
    pub fn into_parts(self) -> (Vec<Config>, Vec<Dependency>) {
        (self.nodes, self.edges)
    }
}

/// A maximal set of configs connected by edges, ignoring direction
#[derive(Debug, Clone)]
pub struct GraphComponent {
    /// Correlation id, increasing in discovery order of the first member
    pub id: usize,
    /// Sub-graph restricted to the members
    pub graph: DependencyGraph,
}

impl GraphComponent {
    pub fn new(id: usize, graph: DependencyGraph) -> Self {
        Self { id, graph }
    }

    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.is_empty()
    }

    pub fn coordinates(&self) -> Vec<Coordinate> {
        self.graph
            .configs()
            .iter()
            .map(|c| c.coordinate.clone())
            .collect()
    }
}

/// A component whose configs are in deployment order
#[derive(Debug, Clone)]
pub struct SortedComponent {
    pub id: usize,
    /// Configs in topological order
    pub configs: Vec<Config>,
    /// Dependencies per config, for failure propagation
    pub dependencies: HashMap<Coordinate, Vec<Coordinate>>,
}

impl SortedComponent {
    pub fn len(&self) -> usize {
        self.configs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }

    pub fn dependencies_of(&self, coordinate: &Coordinate) -> &[Coordinate] {
        self.dependencies
            .get(coordinate)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// A component that cannot be deployed
#[derive(Debug)]
pub struct RejectedComponent {
    pub id: usize,
    pub coordinates: Vec<Coordinate>,
    pub error: GraphError,
}

/// Everything the orchestrator needs for one environment
#[derive(Debug, Default)]
pub struct DeploymentPlan {
    /// Deployable components
    pub components: Vec<SortedComponent>,
    /// Components rejected by the sorter (cycles)
    pub rejected: Vec<RejectedComponent>,
    /// Per-config problems found while building the graph
    pub errors: Vec<GraphError>,
}

impl DeploymentPlan {
    pub fn config_count(&self) -> usize {
        self.components.iter().map(SortedComponent::len).sum::<usize>()
            + self.rejected.iter().map(|r| r.coordinates.len()).sum::<usize>()
    }
}
