//! # Shared Types Crate
//!
//! This crate contains the configuration model every Keel subsystem works
//! on: the addressable [`Coordinate`], the loaded [`Config`] with its
//! [`Template`] and typed [`Parameter`]s, and the [`ResolvedEntity`] that a
//! successful deploy step produces.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: every cross-subsystem type is defined here.
//! - **Closed variants**: parameters and resource types are sum types, so
//!   consumers match exhaustively instead of inspecting type strings.
//! - **Immutable identity**: a `Coordinate` never changes once created.

pub mod config;
pub mod coordinate;
pub mod entity;
pub mod errors;
pub mod parameter;
pub mod template;

pub use config::*;
pub use coordinate::Coordinate;
pub use entity::{Properties, ResolvedEntity};
pub use errors::*;
pub use parameter::*;
pub use template::Template;
