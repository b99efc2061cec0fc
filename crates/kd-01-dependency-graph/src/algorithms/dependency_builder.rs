//! Dependency Graph Builder
//!
//! Builds the dependency graph of one environment's configs from their
//! reference parameters.

use super::implicit_references::rewrite_implicit_references;
use crate::config::GraphConfig;
use crate::domain::entities::{Dependency, DependencyGraph};
use crate::domain::errors::GraphError;
use crate::domain::value_objects::DependencyKind;
use shared_types::Config;
use tracing::debug;

/// Build a dependency graph from loaded configs.
///
/// Every Reference parameter yields an edge from its target to the
/// referencing config. Problems local to one config are collected and
/// returned next to the graph:
/// 1. Malformed template content (the config stays in the graph)
/// 2. Duplicate coordinates (the later config is dropped)
/// 3. References to coordinates outside the loaded set (no edge)
pub fn build_dependency_graph(
    mut configs: Vec<Config>,
    config: &GraphConfig,
) -> (DependencyGraph, Vec<GraphError>) {
    let mut errors = Vec::new();

    if config.implicit_references {
        let synthesized = rewrite_implicit_references(&mut configs);
        debug!(synthesized, "Implicit reference pass complete");
    }

    // Add all configs as nodes, in discovery order
    let mut graph = DependencyGraph::new();
    for cfg in configs {
        if let Err(source) = cfg.template.validate() {
            errors.push(GraphError::Validation {
                coordinate: cfg.coordinate.clone(),
                source,
            });
        }
        if let Err(e) = graph.add_node(cfg) {
            errors.push(e);
        }
    }

    // Collect reference edges
    let mut dependencies = Vec::new();
    for cfg in graph.configs() {
        for (name, parameter) in &cfg.parameters {
            let Some(reference) = parameter.as_reference() else {
                continue;
            };
            if !graph.contains(&reference.coordinate) {
                errors.push(GraphError::UnknownReference {
                    from: cfg.coordinate.clone(),
                    to: reference.coordinate.clone(),
                });
                continue;
            }
            dependencies.push(Dependency::new(
                reference.coordinate.clone(),
                cfg.coordinate.clone(),
                DependencyKind::for_parameter(name),
            ));
        }
    }

    // Explicit references are inserted first so a collapsed edge keeps
    // the user-declared kind
    dependencies.sort_by_key(|d| d.kind);
    for dependency in dependencies {
        graph.add_edge(dependency);
    }

    (graph, errors)
}
