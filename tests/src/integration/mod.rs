//! Cross-crate deployment flows
//!
//! Graph building, sorting, resolution and orchestration exercised
//! together through the public APIs of each crate.

pub mod fixtures;
mod flows;
