//! Sub-graph Splitter
//!
//! Partitions the dependency graph into weakly-connected components with a
//! union-find over the undirected edge view. No edge crosses two components,
//! so components deploy independently of each other.

use crate::domain::entities::{DependencyGraph, GraphComponent};
use std::collections::HashMap;
use tracing::warn;

/// Disjoint-set forest with path halving and union by size.
struct UnionFind {
    parent: Vec<usize>,
    size: Vec<usize>,
}

impl UnionFind {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            size: vec![1; n],
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra == rb {
            return;
        }
        let (big, small) = if self.size[ra] >= self.size[rb] {
            (ra, rb)
        } else {
            (rb, ra)
        };
        self.parent[small] = big;
        self.size[big] += self.size[small];
    }
}

/// Split the graph into weakly-connected components.
///
/// Component ids start at 0 and increase with the discovery position of each
/// component's first config. Members keep discovery order, and isolated
/// configs form single-node components.
pub fn split_components(graph: DependencyGraph) -> Vec<GraphComponent> {
    let n = graph.node_count();
    let mut uf = UnionFind::new(n);

    for idx in 0..n {
        for &dependent in graph.dependents(idx) {
            uf.union(idx, dependent);
        }
    }

    // Assign component ids in discovery order
    let mut component_of_root: HashMap<usize, usize> = HashMap::new();
    let mut membership = Vec::with_capacity(n);
    for idx in 0..n {
        let root = uf.find(idx);
        let next_id = component_of_root.len();
        let id = *component_of_root.entry(root).or_insert(next_id);
        membership.push(id);
    }

    let mut subgraphs: Vec<DependencyGraph> =
        (0..component_of_root.len()).map(|_| DependencyGraph::new()).collect();

    let edge_owner: Vec<Option<usize>> = graph
        .edges()
        .iter()
        .map(|e| graph.index_of(&e.from).map(|idx| membership[idx]))
        .collect();

    let (configs, edges) = graph.into_parts();
    for (idx, config) in configs.into_iter().enumerate() {
        // Coordinates were unique in the source graph
        if let Err(e) = subgraphs[membership[idx]].add_node(config) {
            warn!(error = %e, "Config dropped while splitting");
        }
    }
    for (edge, owner) in edges.into_iter().zip(edge_owner) {
        if let Some(id) = owner {
            subgraphs[id].add_edge(edge);
        }
    }

    subgraphs
        .into_iter()
        .enumerate()
        .map(|(id, graph)| GraphComponent::new(id, graph))
        .collect()
}
