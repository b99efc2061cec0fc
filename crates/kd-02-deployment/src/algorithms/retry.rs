//! Retry policy for deploy calls
//!
//! Three tiers of fixed-wait retries. The wait does not grow between
//! attempts; the target platform's rate limits are tuned against fixed
//! intervals.
//!
//! | Tier     | Wait | Max retries | Used for                       |
//! |----------|------|-------------|--------------------------------|
//! | Normal   | 1 s  | 15          | classic APIs, settings, segments |
//! | Long     | 1 s  | 60          | automations, buckets           |
//! | VeryLong | 1 s  | 240         | documents                      |

use crate::domain::errors::ApiError;
use serde::{Deserialize, Serialize};
use shared_types::ResourceType;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// HTTP status codes worth retrying.
pub const RETRYABLE_STATUS_CODES: [u16; 4] = [429, 502, 503, 504];

/// Wait time and retry budget of one tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrySetting {
    pub wait_time_ms: u64,
    pub max_retries: u32,
}

impl RetrySetting {
    pub const fn new(wait_time_ms: u64, max_retries: u32) -> Self {
        Self {
            wait_time_ms,
            max_retries,
        }
    }

    pub fn wait_time(&self) -> Duration {
        Duration::from_millis(self.wait_time_ms)
    }
}

/// Retry tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RetryTier {
    Normal,
    Long,
    VeryLong,
}

impl RetryTier {
    /// Tier for deploying a resource of `resource_type`.
    pub fn for_resource(resource_type: &ResourceType) -> Self {
        match resource_type {
            ResourceType::ClassicApi { .. }
            | ResourceType::Settings { .. }
            | ResourceType::Segment => RetryTier::Normal,
            ResourceType::Automation { .. } | ResourceType::Bucket => RetryTier::Long,
            ResourceType::Document { .. } => RetryTier::VeryLong,
        }
    }
}

/// Settings of all three tiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrySettings {
    pub normal: RetrySetting,
    pub long: RetrySetting,
    pub very_long: RetrySetting,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            normal: RetrySetting::new(1_000, 15),
            long: RetrySetting::new(1_000, 60),
            very_long: RetrySetting::new(1_000, 240),
        }
    }
}

impl RetrySettings {
    /// The same setting for every tier.
    pub fn uniform(setting: RetrySetting) -> Self {
        Self {
            normal: setting,
            long: setting,
            very_long: setting,
        }
    }

    pub fn get(&self, tier: RetryTier) -> RetrySetting {
        match tier {
            RetryTier::Normal => self.normal,
            RetryTier::Long => self.long,
            RetryTier::VeryLong => self.very_long,
        }
    }
}

/// Issue `call` until it succeeds, fails permanently or the retry budget of
/// `setting` is spent.
///
/// Non-retryable errors are returned as they are. When the budget runs out,
/// the last error is wrapped in `RetriesExhausted` with the attempt count.
/// `on_retry` runs before every wait with the number of the retry about to
/// be made (starting at 1).
pub async fn send_with_retries<T, F, Fut, R>(
    setting: RetrySetting,
    mut call: F,
    mut on_retry: R,
) -> Result<T, ApiError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
    R: FnMut(u32, &ApiError),
{
    let mut retries = 0;

    loop {
        let err = match call().await {
            Ok(value) => {
                if retries > 0 {
                    debug!(retries, "Call succeeded after retrying");
                }
                return Ok(value);
            }
            Err(err) => err,
        };

        if !err.is_retryable() {
            return Err(err);
        }

        if retries >= setting.max_retries {
            warn!(attempts = retries + 1, error = %err, "Retries exhausted");
            return Err(ApiError::RetriesExhausted {
                attempts: retries + 1,
                last: Box::new(err),
            });
        }

        retries += 1;
        on_retry(retries, &err);
        warn!(
            attempt = retries,
            max_retries = setting.max_retries,
            wait_ms = setting.wait_time_ms,
            error = %err,
            "Transient failure, retrying"
        );
        tokio::time::sleep(setting.wait_time()).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::Instant;

    fn busy() -> ApiError {
        ApiError::from_status(503, "unavailable")
    }

    /// Fails with `err` for the first `failures` calls, then succeeds.
    async fn flaky(calls: &AtomicU32, failures: u32, err: ApiError) -> Result<&'static str, ApiError> {
        let n = calls.fetch_add(1, Ordering::SeqCst);
        if n < failures {
            Err(err)
        } else {
            Ok("done")
        }
    }

    #[test]
    fn test_default_tiers() {
        let settings = RetrySettings::default();
        assert_eq!(settings.get(RetryTier::Normal), RetrySetting::new(1_000, 15));
        assert_eq!(settings.get(RetryTier::Long).max_retries, 60);
        assert_eq!(settings.get(RetryTier::VeryLong).max_retries, 240);
    }

    #[test]
    fn test_tier_per_resource() {
        assert_eq!(RetryTier::for_resource(&ResourceType::Segment), RetryTier::Normal);
        assert_eq!(RetryTier::for_resource(&ResourceType::Bucket), RetryTier::Long);
        assert_eq!(
            RetryTier::for_resource(&ResourceType::Document {
                document: shared_types::DocumentKind::Notebook
            }),
            RetryTier::VeryLong
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_two_transient_failures_then_success() {
        let calls = AtomicU32::new(0);
        let mut retries_seen = Vec::new();
        let start = Instant::now();

        let result = send_with_retries(
            RetrySetting::new(1_000, 5),
            || flaky(&calls, 2, busy()),
            |attempt, _| retries_seen.push(attempt),
        )
        .await;

        assert_eq!(result, Ok("done"));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(retries_seen, vec![1, 2]);
        // Exactly two fixed waits elapsed
        assert_eq!(start.elapsed(), Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_permanent_error_not_retried() {
        let calls = AtomicU32::new(0);
        let start = Instant::now();

        let result = send_with_retries(
            RetrySetting::new(1_000, 5),
            || flaky(&calls, 10, ApiError::from_status(400, "bad request")),
            |_, _| {},
        )
        .await;

        assert!(matches!(result, Err(ApiError::Permanent { status: 400, .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_exhausted_wraps_last_error() {
        let calls = AtomicU32::new(0);

        let result = send_with_retries(
            RetrySetting::new(100, 3),
            || flaky(&calls, 10, ApiError::Network("connection reset".into())),
            |_, _| {},
        )
        .await;

        match result {
            Err(ApiError::RetriesExhausted { attempts, last }) => {
                assert_eq!(attempts, 4);
                assert_eq!(*last, ApiError::Network("connection reset".into()));
            }
            other => panic!("unexpected result: {other:?}"),
        }
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_retries_gives_up_immediately() {
        let calls = AtomicU32::new(0);

        let result = send_with_retries(
            RetrySetting::new(1_000, 0),
            || flaky(&calls, 1, busy()),
            |_, _| {},
        )
        .await;

        assert!(matches!(result, Err(ApiError::RetriesExhausted { attempts: 1, .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
