//! Algorithms module for the Dependency Graph
//!
//! Contains:
//! - Implicit reference rewriting
//! - Dependency graph builder
//! - Sub-graph splitter (union-find)
//! - Kahn's topological sort

pub mod dependency_builder;
pub mod implicit_references;
pub mod kahns;
pub mod splitter;

pub use dependency_builder::build_dependency_graph;
pub use implicit_references::rewrite_implicit_references;
pub use kahns::kahns_topological_sort;
pub use splitter::split_components;
