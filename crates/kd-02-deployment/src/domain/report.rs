//! Deployment events and reports

use super::errors::DeploymentError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared_types::{Coordinate, ResolvedEntity};
use std::fmt;

/// Final state of one config
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentState {
    /// Deployed and recorded in the entity map
    Success,
    /// Deployment attempted or planned, and failed
    Error,
    /// Not deployed because of a skip flag or a failed/skipped dependency
    Skipped,
    /// Never scheduled (cancelled, fail-fast or aborted load)
    Excluded,
}

impl DeploymentState {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeploymentState::Success => "success",
            DeploymentState::Error => "error",
            DeploymentState::Skipped => "skipped",
            DeploymentState::Excluded => "excluded",
        }
    }
}

impl fmt::Display for DeploymentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one config, streamed to the reporter as it happens
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploymentEvent {
    pub coordinate: Coordinate,
    pub state: DeploymentState,
    /// Error message for `Error` events and failed-dependency skips
    pub error: Option<String>,
    /// Human-readable reason for skips and exclusions
    pub details: Option<String>,
    /// Component the config belongs to, when it was planned
    pub component_id: Option<usize>,
    pub timestamp: DateTime<Utc>,
}

impl DeploymentEvent {
    pub fn new(coordinate: Coordinate, state: DeploymentState) -> Self {
        Self {
            coordinate,
            state,
            error: None,
            details: None,
            component_id: None,
            timestamp: Utc::now(),
        }
    }

    pub fn success(coordinate: Coordinate) -> Self {
        Self::new(coordinate, DeploymentState::Success)
    }

    pub fn error(coordinate: Coordinate, error: &DeploymentError) -> Self {
        Self::new(coordinate, DeploymentState::Error).with_error(error)
    }

    pub fn skipped(coordinate: Coordinate, details: impl Into<String>) -> Self {
        Self::new(coordinate, DeploymentState::Skipped).with_details(details)
    }

    pub fn excluded(coordinate: Coordinate, details: impl Into<String>) -> Self {
        Self::new(coordinate, DeploymentState::Excluded).with_details(details)
    }

    pub fn with_error(mut self, error: &DeploymentError) -> Self {
        self.error = Some(error.to_string());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn in_component(mut self, component_id: usize) -> Self {
        self.component_id = Some(component_id);
        self
    }
}

/// Counts by state plus start and end time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentSummary {
    pub success: usize,
    pub error: usize,
    pub skipped: usize,
    pub excluded: usize,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
}

impl DeploymentSummary {
    /// Summarise `events` for a run that began at `started_at` and ends now.
    pub fn from_events(events: &[DeploymentEvent], started_at: DateTime<Utc>) -> Self {
        let mut summary = Self {
            success: 0,
            error: 0,
            skipped: 0,
            excluded: 0,
            started_at,
            ended_at: Utc::now(),
        };
        for event in events {
            match event.state {
                DeploymentState::Success => summary.success += 1,
                DeploymentState::Error => summary.error += 1,
                DeploymentState::Skipped => summary.skipped += 1,
                DeploymentState::Excluded => summary.excluded += 1,
            }
        }
        summary
    }

    pub fn count(&self, state: DeploymentState) -> usize {
        match state {
            DeploymentState::Success => self.success,
            DeploymentState::Error => self.error,
            DeploymentState::Skipped => self.skipped,
            DeploymentState::Excluded => self.excluded,
        }
    }

    pub fn total(&self) -> usize {
        self.success + self.error + self.skipped + self.excluded
    }

    pub fn duration(&self) -> chrono::Duration {
        self.ended_at - self.started_at
    }
}

/// Everything that happened while deploying one environment
#[derive(Debug, Clone)]
pub struct DeploymentReport {
    pub environment: String,
    /// One event per config
    pub events: Vec<DeploymentEvent>,
    pub summary: DeploymentSummary,
    /// Entities of deployed and skipped configs
    pub results: Vec<ResolvedEntity>,
    /// Root-cause errors; configs skipped because of them are not repeated
    pub errors: Vec<DeploymentError>,
}

impl DeploymentReport {
    /// False if any config errored. Callers map this to the exit code.
    pub fn is_success(&self) -> bool {
        self.errors.is_empty() && self.summary.error == 0
    }

    /// The event reported for one config.
    pub fn event(&self, coordinate: &Coordinate) -> Option<&DeploymentEvent> {
        self.events.iter().find(|e| &e.coordinate == coordinate)
    }

    /// The entity resolved for one config.
    pub fn result(&self, coordinate: &Coordinate) -> Option<&ResolvedEntity> {
        self.results.iter().find(|r| &r.coordinate == coordinate)
    }
}
