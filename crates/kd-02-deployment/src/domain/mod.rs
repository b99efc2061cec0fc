//! Domain module for the Deployment subsystem
//!
//! Contains the entity map, deployment events and reports, and errors.

pub mod entity_map;
pub mod errors;
pub mod report;

pub use entity_map::EntityMap;
pub use errors::*;
pub use report::*;
