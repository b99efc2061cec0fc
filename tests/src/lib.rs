//! # Keel Test Suite
//!
//! Unified test crate containing:
//!
//! ## Structure
//!
//! ```text
//! tests/
//! ├── benches/          # Planning throughput (criterion)
//! └── src/
//!     └── integration/  # Cross-crate deployment flows
//!         ├── fixtures.rs
//!         └── flows.rs
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p keel-tests
//!
//! # Benchmarks
//! cargo bench -p keel-tests
//! ```

#![allow(dead_code)]

pub mod integration;
