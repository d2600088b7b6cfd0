//! Per-platform retry wrapper
//!
//! Runs one platform's publish action up to a fixed number of times with a
//! fixed pause between tries. Each failed try is appended to the attempt
//! history that ends up in the platform's [`PlatformResult`].

use std::future::Future;
use std::time::Duration;

use tokio::time::{sleep, timeout};
use tracing::{debug, info, warn};

use crate::config::WorkflowConfig;
use crate::error::{PlatformError, PostboiError, Result};
use crate::types::{AttemptRecord, PlatformKind, PlatformResult};

/// Attempt cap, pause and per-request timeout for one retry sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
    pub request_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(2),
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration, request_timeout: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
            request_timeout,
        }
    }

    pub fn from_config(config: &WorkflowConfig) -> Self {
        Self::new(
            config.max_attempts,
            config.retry_delay(),
            config.request_timeout(),
        )
    }
}

/// Run `action` under `policy` and fold the outcome into a [`PlatformResult`].
///
/// Success returns at once with the failures that preceded it. A
/// non-retryable error (see [`PostboiError::is_retryable`]) stops the
/// sequence after recording it. The pause only happens between attempts,
/// never after the last one. A call exceeding `request_timeout` counts as
/// an ordinary network failure.
pub async fn publish_with_retry<F, Fut>(
    platform: PlatformKind,
    policy: &RetryPolicy,
    mut action: F,
) -> PlatformResult
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<String>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempts: Vec<AttemptRecord> = Vec::new();
    let mut last_error = String::new();

    for attempt in 1..=max_attempts {
        debug!(platform = %platform, attempt, max_attempts, "Publishing");

        let outcome = match timeout(policy.request_timeout, action()).await {
            Ok(result) => result,
            Err(_) => Err(PostboiError::from(PlatformError::Network(format!(
                "{} request timed out after {}",
                platform.display_name(),
                humantime::format_duration(policy.request_timeout)
            )))),
        };

        let error = match outcome {
            Ok(detail) => {
                if attempt > 1 {
                    info!(
                        "Successfully posted to {} on attempt {}",
                        platform.display_name(),
                        attempt
                    );
                }
                return PlatformResult::succeeded(platform, detail, attempts);
            }
            Err(e) => e,
        };

        last_error = error.to_string();
        attempts.push(AttemptRecord::new(attempt, last_error.clone()));

        if !error.is_retryable() {
            warn!(
                "Not retrying {}: {}",
                platform.display_name(),
                last_error
            );
            return PlatformResult::failed(platform, last_error, attempts);
        }

        if attempt < max_attempts {
            warn!(
                "Error posting to {} (attempt {}/{}): {}. Retrying in {}...",
                platform.display_name(),
                attempt,
                max_attempts,
                last_error,
                humantime::format_duration(policy.delay)
            );
            sleep(policy.delay).await;
        }
    }

    warn!(
        "Failed to post to {} after {} attempts: {}",
        platform.display_name(),
        max_attempts,
        last_error
    );
    PlatformResult::failed(platform, last_error, attempts)
}
