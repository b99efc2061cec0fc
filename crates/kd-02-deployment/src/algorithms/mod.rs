//! Algorithms module for the Deployment subsystem
//!
//! Contains:
//! - Fixed-wait retry policy

pub mod retry;

pub use retry::{send_with_retries, RetrySetting, RetrySettings, RetryTier};
