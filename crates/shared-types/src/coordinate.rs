//! # Coordinates
//!
//! A `Coordinate` is the globally unique key of one configuration unit inside
//! one environment's deployment set.

use serde::{Deserialize, Serialize};
use std::fmt;

/// `{project, type, configId}` key of a config.
///
/// The ordering derive is used to keep maps and diagnostics deterministic.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Coordinate {
    /// Project the config was loaded from.
    pub project: String,
    /// Type identifier (API name, settings schema, automation resource...).
    #[serde(rename = "type")]
    pub config_type: String,
    /// Config id, unique within project and type.
    pub config_id: String,
}

impl Coordinate {
    pub fn new(
        project: impl Into<String>,
        config_type: impl Into<String>,
        config_id: impl Into<String>,
    ) -> Self {
        Self {
            project: project.into(),
            config_type: config_type.into(),
            config_id: config_id.into(),
        }
    }

    /// Whether both coordinates live in the same project.
    pub fn same_project(&self, other: &Coordinate) -> bool {
        self.project == other.project
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.project, self.config_type, self.config_id)
    }
}
