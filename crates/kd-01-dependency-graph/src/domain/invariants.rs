//! Domain invariants for the Dependency Graph

use super::entities::{DependencyGraph, GraphComponent, SortedComponent};
use shared_types::Coordinate;
use std::collections::{HashMap, HashSet};

/// INVARIANT-1: Topological Order
/// For every edge (u -> v) inside the component, u is deployed before v.
pub fn invariant_topological_order(sorted: &SortedComponent, graph: &DependencyGraph) -> bool {
    let position: HashMap<&Coordinate, usize> = sorted
        .configs
        .iter()
        .enumerate()
        .map(|(i, c)| (&c.coordinate, i))
        .collect();

    graph.edges().iter().all(|edge| {
        match (position.get(&edge.from), position.get(&edge.to)) {
            (Some(from), Some(to)) => from < to,
            // Edges leaving the component are not this component's concern
            _ => true,
        }
    })
}

/// INVARIANT-2: Completeness
/// Every config of the component appears exactly once in the sorted output.
pub fn invariant_completeness(sorted: &SortedComponent, component: &GraphComponent) -> bool {
    let mut seen = HashSet::new();
    for config in &sorted.configs {
        if !seen.insert(&config.coordinate) {
            return false;
        }
    }

    let expected: HashSet<&Coordinate> = component
        .graph
        .configs()
        .iter()
        .map(|c| &c.coordinate)
        .collect();

    seen == expected
}

/// INVARIANT-3: Partition
/// Every coordinate of the graph belongs to exactly one component and no edge
/// crosses two components.
pub fn invariant_partition(components: &[GraphComponent], graph: &DependencyGraph) -> bool {
    let mut owner: HashMap<&Coordinate, usize> = HashMap::new();
    for component in components {
        for config in component.graph.configs() {
            if owner.insert(&config.coordinate, component.id).is_some() {
                return false;
            }
        }
    }

    if owner.len() != graph.node_count() {
        return false;
    }

    graph
        .edges()
        .iter()
        .all(|edge| owner.get(&edge.from) == owner.get(&edge.to))
}
