//! Ports module for the Dependency Graph
//!
//! Defines the inbound (API) port trait.

pub mod inbound;

pub use inbound::DependencyGraphApi;
