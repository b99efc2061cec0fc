//! Reporters
//!
//! - [`TracingReporter`]: one log line per event
//! - [`MemoryReporter`]: keeps events in memory for inspection

use crate::domain::report::{DeploymentEvent, DeploymentState, DeploymentSummary};
use crate::ports::outbound::Reporter;
use parking_lot::Mutex;
use tracing::{error, info, warn};

/// Logs every event through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn report(&self, event: &DeploymentEvent) {
        let details = event.details.as_deref().unwrap_or("");
        match event.state {
            DeploymentState::Success => {
                info!(coordinate = %event.coordinate, state = %event.state, "Deployed config")
            }
            DeploymentState::Skipped => {
                info!(coordinate = %event.coordinate, state = %event.state, details, "Skipped config")
            }
            DeploymentState::Excluded => {
                warn!(coordinate = %event.coordinate, state = %event.state, details, "Excluded config")
            }
            DeploymentState::Error => error!(
                coordinate = %event.coordinate,
                state = %event.state,
                error = event.error.as_deref().unwrap_or(""),
                "Failed to deploy config"
            ),
        }
    }

    fn finish(&self, environment: &str, summary: &DeploymentSummary) {
        info!(
            environment,
            success = summary.success,
            error = summary.error,
            skipped = summary.skipped,
            excluded = summary.excluded,
            duration_ms = summary.duration().num_milliseconds(),
            "Deployment finished"
        );
    }
}

/// Collects events and summaries.
#[derive(Debug, Default)]
pub struct MemoryReporter {
    events: Mutex<Vec<DeploymentEvent>>,
    summaries: Mutex<Vec<(String, DeploymentSummary)>>,
}

impl MemoryReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Events in the order they were reported.
    pub fn events(&self) -> Vec<DeploymentEvent> {
        self.events.lock().clone()
    }

    pub fn summaries(&self) -> Vec<(String, DeploymentSummary)> {
        self.summaries.lock().clone()
    }
}

impl Reporter for MemoryReporter {
    fn report(&self, event: &DeploymentEvent) {
        self.events.lock().push(event.clone());
    }

    fn finish(&self, environment: &str, summary: &DeploymentSummary) {
        self.summaries
            .lock()
            .push((environment.to_string(), summary.clone()));
    }
}
