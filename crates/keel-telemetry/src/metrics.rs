//! Prometheus metrics for Keel deployments.
//!
//! All metrics follow the naming convention: `keel_<metric>_<unit>`
//!
//! ## Metric Types
//!
//! - **Counter**: Monotonically increasing value (e.g., configs_deployed_total)
//! - **Histogram**: Distribution of values (e.g., deploy_duration_seconds)

use prometheus::{
    exponential_buckets, Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts,
    Registry, TextEncoder,
};

use crate::TelemetryError;

/// Deployment metrics and the registry they are registered in.
///
/// Cloning is cheap; clones update the same series.
#[derive(Clone)]
pub struct DeploymentMetrics {
    registry: Registry,
    configs_deployed: IntCounterVec,
    retries: IntCounter,
    deploy_duration: Histogram,
}

impl DeploymentMetrics {
    /// Create the metrics in a fresh registry.
    pub fn new() -> Result<Self, TelemetryError> {
        Self::with_registry(Registry::new())
    }

    /// Create the metrics in an existing registry.
    pub fn with_registry(registry: Registry) -> Result<Self, TelemetryError> {
        let init = |e: prometheus::Error| TelemetryError::MetricsInit(e.to_string());

        let configs_deployed = IntCounterVec::new(
            Opts::new(
                "keel_configs_deployed_total",
                "Configs processed, by final state",
            ),
            &["state"], // success/error/skipped/excluded
        )
        .map_err(init)?;

        let retries = IntCounter::new(
            "keel_deploy_retries_total",
            "Deploy calls re-issued after a transient failure",
        )
        .map_err(init)?;

        let buckets = exponential_buckets(0.01, 2.0, 14).map_err(init)?;
        let deploy_duration = Histogram::with_opts(
            HistogramOpts::new(
                "keel_deploy_duration_seconds",
                "Time spent deploying one config, retries included",
            )
            .buckets(buckets),
        )
        .map_err(init)?;

        registry
            .register(Box::new(configs_deployed.clone()))
            .map_err(init)?;
        registry.register(Box::new(retries.clone())).map_err(init)?;
        registry
            .register(Box::new(deploy_duration.clone()))
            .map_err(init)?;

        Ok(Self {
            registry,
            configs_deployed,
            retries,
            deploy_duration,
        })
    }

    /// Count one config reaching its final state.
    pub fn record_config(&self, state: &str) {
        self.configs_deployed.with_label_values(&[state]).inc();
    }

    pub fn record_retry(&self) {
        self.retries.inc();
    }

    /// Start timing one deploy. Observation happens on drop.
    pub fn start_timer(&self) -> HistogramTimer {
        HistogramTimer::new(&self.deploy_duration)
    }

    pub fn configs_deployed(&self, state: &str) -> u64 {
        self.configs_deployed.with_label_values(&[state]).get()
    }

    pub fn retries(&self) -> u64 {
        self.retries.get()
    }

    /// Encode all metrics as Prometheus text format.
    pub fn gather_text(&self) -> Result<String, TelemetryError> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder
            .encode(&metric_families, &mut buffer)
            .map_err(|e| TelemetryError::Encode(e.to_string()))?;
        String::from_utf8(buffer).map_err(|e| TelemetryError::Encode(e.to_string()))
    }
}

impl std::fmt::Debug for DeploymentMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeploymentMetrics")
            .field("retries", &self.retries.get())
            .finish_non_exhaustive()
    }
}

/// Timer guard for automatic histogram observation.
pub struct HistogramTimer {
    histogram: Histogram,
    start: std::time::Instant,
}

impl HistogramTimer {
    /// Start a new timer for the given histogram.
    pub fn new(histogram: &Histogram) -> Self {
        Self {
            histogram: histogram.clone(),
            start: std::time::Instant::now(),
        }
    }
}

impl Drop for HistogramTimer {
    fn drop(&mut self) {
        let duration = self.start.elapsed().as_secs_f64();
        self.histogram.observe(duration);
    }
}
