//! Bounded retries with exponential backoff for single outbound calls.
//!
//! Attempt 1 runs immediately; before attempt k+1 the caller sleeps
//! `2^k * base_delay`. Intermediate failures are logged and swallowed;
//! after the final attempt the last error is surfaced.

use std::time::Duration;

use tracing::{debug, warn};

use crate::error::{NightbriefError, Result};

/// Retry configuration for a single outbound call.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Policy with a custom attempt budget and the default 1s base delay.
    pub fn with_max_attempts(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            ..Self::default()
        }
    }

    /// Backoff delay applied after the given (1-based) failed attempt.
    fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay * 2u32.saturating_pow(attempt)
    }
}

/// Run `op` under the given policy, returning the first success or the
/// last error once the attempt budget is exhausted.
///
/// `label` names the call in log output.
pub async fn retry<T, F, Fut>(policy: &RetryPolicy, label: &str, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    if policy.max_attempts == 0 {
        return Err(NightbriefError::validation(
            "retry policy must allow at least one attempt",
        ));
    }

    let mut last_err = None;

    for attempt in 1..=policy.max_attempts {
        match op().await {
            Ok(value) => {
                if attempt > 1 {
                    debug!(label, attempt, "call succeeded after retry");
                }
                return Ok(value);
            }
            Err(e) => {
                warn!(
                    label,
                    attempt,
                    max_attempts = policy.max_attempts,
                    error = %e,
                    "call attempt failed"
                );
                last_err = Some(e);

                if attempt < policy.max_attempts {
                    let delay = policy.delay_after(attempt);
                    debug!(label, delay_ms = delay.as_millis() as u64, "backing off");
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    Err(last_err
        .unwrap_or_else(|| NightbriefError::validation("retry loop made no attempts")))
}
