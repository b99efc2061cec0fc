//! # Keel Telemetry
//!
//! Logging and metrics for Keel deployments.
//!
//! ## Components
//!
//! - **Logging**: `tracing-subscriber` with an env filter and a JSON or
//!   human-readable formatter
//! - **Metrics**: Prometheus counters and histograms owned by a
//!   [`DeploymentMetrics`] handle; nothing is registered globally
//!
//! ## Usage
//!
//! ```rust,ignore
//! use keel_telemetry::{init_logging, DeploymentMetrics, TelemetryConfig};
//!
//! let config = TelemetryConfig::from_env();
//! init_logging(&config)?;
//!
//! let metrics = DeploymentMetrics::new()?;
//! // hand `metrics` to the deployment service, then
//! println!("{}", metrics.gather_text()?);
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `KEEL_LOG_LEVEL` | `info` | Log level filter (falls back to `RUST_LOG`) |
//! | `KEEL_JSON_LOGS` | `false` | Emit JSON lines instead of human output |
//! | `KEEL_SERVICE_NAME` | `keel` | Service name attached to log lines |

mod config;
mod logging;
mod metrics;

pub use config::TelemetryConfig;
pub use logging::init_logging;
pub use metrics::{DeploymentMetrics, HistogramTimer};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),

    #[error("Failed to encode metrics: {0}")]
    Encode(String),
}

/// Convenience macro for creating a span with deployment context.
///
/// # Example
///
/// ```rust,ignore
/// let span = keel_telemetry::deploy_span!("deploy_component", component_id = 3, environment = "prod");
/// ```
#[macro_export]
macro_rules! deploy_span {
    ($name:expr, $($field:tt)*) => {
        tracing::info_span!($name, $($field)*)
    };
}
