//! # KD-01: Dependency Graph Subsystem
//!
//! Builds the cross-project dependency graph of configs, splits it into
//! independently deployable components and orders each component so that
//! referenced configs deploy before the configs referencing them.
//!
//! ## Architecture
//!
//! - **Domain**: Core entities (DependencyGraph, GraphComponent, SortedComponent)
//! - **Algorithms**: implicit-reference rewriting, graph building, splitting, Kahn's sort
//! - **Ports**: Inbound (DependencyGraphApi)
//! - **Application**: Service orchestration (DependencyGraphService)
//!
//! ## Pipeline
//!
//! ```text
//! configs ──► rewrite implicit references ──► build edges ──► split ──► sort
//!                                                              │          │
//!                                                     GraphComponent   SortedComponent
//! ```

pub mod algorithms;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

pub use application::service::DependencyGraphService;
pub use config::GraphConfig;
pub use domain::entities::*;
pub use domain::errors::GraphError;
pub use domain::value_objects::*;
pub use ports::inbound::DependencyGraphApi;
