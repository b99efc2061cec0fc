//! Application layer for the Dependency Graph

pub mod service;
