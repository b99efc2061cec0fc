//! Kahn's Topological Sort Algorithm
//!
//! O((V + E) log V) with a min-heap of ready nodes, so that configs without
//! an ordering constraint between them come out in discovery order. When a
//! cycle blocks the sort, Tarjan's algorithm over the unscheduled nodes names
//! exactly the configs that sit on a cycle.

use crate::domain::entities::{DependencyGraph, GraphComponent, SortedComponent};
use crate::domain::errors::GraphError;
use shared_types::Coordinate;
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

/// Perform Kahn's topological sort on one component.
///
/// Returns the component's configs in deployment order, or
/// `CyclicDependency` naming every config on a cycle.
pub fn kahns_topological_sort(component: &GraphComponent) -> Result<SortedComponent, GraphError> {
    let graph = &component.graph;
    let n = graph.node_count();

    // 1. Copy in-degrees (we'll modify them)
    let mut in_degree: Vec<usize> = (0..n).map(|idx| graph.in_degree(idx)).collect();

    // 2. Seed the heap with zero in-degree nodes
    let mut ready: BinaryHeap<Reverse<usize>> = (0..n)
        .filter(|&idx| in_degree[idx] == 0)
        .map(Reverse)
        .collect();

    // 3. Always take the earliest discovered ready node
    let mut order = Vec::with_capacity(n);
    while let Some(Reverse(node)) = ready.pop() {
        order.push(node);
        for &dependent in graph.dependents(node) {
            in_degree[dependent] = in_degree[dependent].saturating_sub(1);
            if in_degree[dependent] == 0 {
                ready.push(Reverse(dependent));
            }
        }
    }

    // 4. Cycle detection: if not all nodes scheduled, there's a cycle
    if order.len() < n {
        let mut blocked = vec![true; n];
        for &idx in &order {
            blocked[idx] = false;
        }
        return Err(GraphError::CyclicDependency {
            coordinates: cycle_members(graph, &blocked),
        });
    }

    let configs = order
        .into_iter()
        .map(|idx| graph.configs()[idx].clone())
        .collect();

    let mut dependencies: HashMap<Coordinate, Vec<Coordinate>> = HashMap::new();
    for edge in graph.edges() {
        dependencies
            .entry(edge.to.clone())
            .or_default()
            .push(edge.from.clone());
    }

    Ok(SortedComponent {
        id: component.id,
        configs,
        dependencies,
    })
}

/// Members of every non-trivial strongly-connected component among the
/// `blocked` nodes, in discovery order.
///
/// Nodes that are only downstream of a cycle are blocked too, but they are
/// not part of it.
fn cycle_members(graph: &DependencyGraph, blocked: &[bool]) -> Vec<Coordinate> {
    let mut tarjan = Tarjan::new(graph.node_count());
    for start in 0..graph.node_count() {
        if blocked[start] && tarjan.index[start].is_none() {
            tarjan.run(graph, blocked, start);
        }
    }

    let mut on_cycle = vec![false; graph.node_count()];
    for scc in &tarjan.components {
        let self_loop = scc.len() == 1 && graph.dependents(scc[0]).contains(&scc[0]);
        if scc.len() > 1 || self_loop {
            for &idx in scc {
                on_cycle[idx] = true;
            }
        }
    }

    graph
        .configs()
        .iter()
        .enumerate()
        .filter(|(idx, _)| on_cycle[*idx])
        .map(|(_, c)| c.coordinate.clone())
        .collect()
}

/// Iterative Tarjan SCC state.
struct Tarjan {
    index: Vec<Option<usize>>,
    lowlink: Vec<usize>,
    on_stack: Vec<bool>,
    stack: Vec<usize>,
    next_index: usize,
    components: Vec<Vec<usize>>,
}

impl Tarjan {
    fn new(n: usize) -> Self {
        Self {
            index: vec![None; n],
            lowlink: vec![0; n],
            on_stack: vec![false; n],
            stack: Vec::new(),
            next_index: 0,
            components: Vec::new(),
        }
    }

    fn visit(&mut self, node: usize) {
        self.index[node] = Some(self.next_index);
        self.lowlink[node] = self.next_index;
        self.next_index += 1;
        self.stack.push(node);
        self.on_stack[node] = true;
    }

    fn run(&mut self, graph: &DependencyGraph, allowed: &[bool], start: usize) {
        // (node, position of the next neighbour to explore)
        let mut call_stack: Vec<(usize, usize)> = vec![(start, 0)];
        self.visit(start);

        while let Some(&(node, pos)) = call_stack.last() {
            let neighbours = graph.dependents(node);
            if pos < neighbours.len() {
                let top = call_stack.len() - 1;
                call_stack[top].1 += 1;

                let next = neighbours[pos];
                if !allowed[next] {
                    continue;
                }
                match self.index[next] {
                    None => {
                        self.visit(next);
                        call_stack.push((next, 0));
                    }
                    Some(next_index) if self.on_stack[next] => {
                        self.lowlink[node] = self.lowlink[node].min(next_index);
                    }
                    Some(_) => {}
                }
                continue;
            }

            call_stack.pop();
            if let Some(&(parent, _)) = call_stack.last() {
                self.lowlink[parent] = self.lowlink[parent].min(self.lowlink[node]);
            }

            if Some(self.lowlink[node]) == self.index[node] {
                let mut scc = Vec::new();
                while let Some(member) = self.stack.pop() {
                    self.on_stack[member] = false;
                    scc.push(member);
                    if member == node {
                        break;
                    }
                }
                self.components.push(scc);
            }
        }
    }
}
