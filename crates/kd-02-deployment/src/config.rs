//! Configuration for the Deployment subsystem

use crate::algorithms::retry::RetrySettings;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

/// Deployment configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentConfig {
    /// Components deployed in parallel
    pub concurrency: usize,
    /// Deadline for a single deploy attempt
    pub call_timeout_secs: u64,
    /// Resolve and render everything, call no remote API
    pub dry_run: bool,
    /// Stop scheduling new configs after the first failure
    pub fail_fast: bool,
    /// Retry tiers
    pub retry: RetrySettings,
}

impl Default for DeploymentConfig {
    fn default() -> Self {
        Self {
            concurrency: 4,
            call_timeout_secs: 60,
            dry_run: false,
            fail_fast: false,
            retry: RetrySettings::default(),
        }
    }
}

impl DeploymentConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `KEEL_CONCURRENCY`: Parallel components (default: 4)
    /// - `KEEL_CALL_TIMEOUT_SECS`: Per-attempt timeout (default: 60)
    /// - `KEEL_DRY_RUN`: Enable dry run (default: false)
    /// - `KEEL_FAIL_FAST`: Stop after the first failure (default: false)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env), reading from `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let flag = |key: &str| {
            lookup(key)
                .map(|v| v.to_lowercase() == "true" || v == "1")
                .unwrap_or(false)
        };

        Self {
            concurrency: lookup("KEEL_CONCURRENCY")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.concurrency),

            call_timeout_secs: lookup("KEEL_CALL_TIMEOUT_SECS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.call_timeout_secs),

            dry_run: flag("KEEL_DRY_RUN"),
            fail_fast: flag("KEEL_FAIL_FAST"),
            retry: defaults.retry,
        }
    }

    /// Number of workers; a concurrency of 0 still runs one.
    pub fn worker_count(&self) -> usize {
        self.concurrency.max(1)
    }

    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = DeploymentConfig::default();
        assert_eq!(config.concurrency, 4);
        assert_eq!(config.call_timeout(), Duration::from_secs(60));
        assert!(!config.dry_run);
        assert!(!config.fail_fast);
    }

    #[test]
    fn test_from_lookup() {
        let config = DeploymentConfig::from_lookup(lookup(&[
            ("KEEL_CONCURRENCY", "8"),
            ("KEEL_CALL_TIMEOUT_SECS", "5"),
            ("KEEL_DRY_RUN", "true"),
            ("KEEL_FAIL_FAST", "1"),
        ]));

        assert_eq!(config.concurrency, 8);
        assert_eq!(config.call_timeout_secs, 5);
        assert!(config.dry_run);
        assert!(config.fail_fast);
    }

    #[test]
    fn test_invalid_values_fall_back_to_defaults() {
        let config = DeploymentConfig::from_lookup(lookup(&[("KEEL_CONCURRENCY", "many")]));
        assert_eq!(config.concurrency, 4);
    }

    #[test]
    fn test_zero_concurrency_clamped() {
        let config = DeploymentConfig {
            concurrency: 0,
            ..Default::default()
        };
        assert_eq!(config.worker_count(), 1);
    }
}
