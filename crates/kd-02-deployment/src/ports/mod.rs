//! Ports module for the Deployment subsystem
//!
//! Defines inbound (API) and outbound (SPI) port traits.

pub mod inbound;
pub mod outbound;

pub use inbound::DeploymentApi;
pub use outbound::{DeployApi, DeployContext, EnvironmentLookup, Reporter};
