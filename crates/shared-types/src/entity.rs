//! # Resolved Entities
//!
//! The outcome of deploying one config: its remote identity and resolved
//! properties. Written once per config per environment, read by dependents.

use crate::coordinate::Coordinate;
use crate::parameter::ID_PROPERTY;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Resolved property values by name.
pub type Properties = BTreeMap<String, serde_json::Value>;

/// Remote identity of a deployed (or skipped) config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedEntity {
    pub coordinate: Coordinate,
    /// Display name on the remote platform; empty when unknown
    pub entity_name: String,
    pub properties: Properties,
    /// True when the config was not deployed
    pub skip: bool,
}

impl ResolvedEntity {
    pub fn new(coordinate: Coordinate, entity_name: impl Into<String>, properties: Properties) -> Self {
        Self {
            coordinate,
            entity_name: entity_name.into(),
            properties,
            skip: false,
        }
    }

    /// Entity recorded for a config that was skipped.
    pub fn skipped(coordinate: Coordinate) -> Self {
        Self {
            coordinate,
            entity_name: String::new(),
            properties: Properties::new(),
            skip: true,
        }
    }

    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }

    /// Remote identifier, if the adapter reported one.
    pub fn id(&self) -> Option<&str> {
        self.properties.get(ID_PROPERTY).and_then(|v| v.as_str())
    }
}
