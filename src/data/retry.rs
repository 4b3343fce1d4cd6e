//! Bounded retry with exponential backoff and jitter
//!
//! One policy object shared by every gateway call. Only errors for which
//! `CviError::is_retryable` holds (429, 5xx, timeouts) are retried; anything
//! else is returned immediately.

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::{CviError, CviResult};

/// Retry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts including the first one
    pub max_attempts: u32,
    /// Delay before the second attempt (doubles each attempt)
    pub base_delay_ms: u64,
    /// Maximum delay cap
    pub max_delay_ms: u64,
    /// Upper bound of the random jitter added to each delay
    pub jitter_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            base_delay_ms: 500,
            max_delay_ms: 8000,
            jitter_ms: 250,
        }
    }
}

impl RetryPolicy {
    /// Single attempt, no waiting
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            base_delay_ms: 0,
            max_delay_ms: 0,
            jitter_ms: 0,
        }
    }

    /// Deterministic part of the wait before retry number `retry` (1-based),
    /// raised to a server `Retry-After` when given, capped at `max_delay_ms`.
    pub fn backoff_ms(&self, retry: u32, retry_after_secs: Option<u64>) -> u64 {
        let shift = retry.saturating_sub(1).min(20);
        let exp = self.base_delay_ms.saturating_mul(1u64 << shift);
        let server = retry_after_secs.unwrap_or(0).saturating_mul(1000);
        exp.max(server).min(self.max_delay_ms)
    }

    fn delay(&self, retry: u32, err: &CviError) -> Duration {
        let jitter = if self.jitter_ms > 0 {
            rand::random::<u64>() % self.jitter_ms
        } else {
            0
        };
        Duration::from_millis(self.backoff_ms(retry, err.retry_after_secs()) + jitter)
    }
}

/// Run `op` under `policy`.
///
/// The first attempt is immediate. Returns the last error once attempts are
/// exhausted, or the first non-retryable error.
pub async fn with_retry<T, F, Fut>(policy: &RetryPolicy, label: &str, mut op: F) -> CviResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = CviResult<T>>,
{
    let attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_retryable() && attempt < attempts => {
                let wait = policy.delay(attempt, &e);
                tracing::warn!(
                    "{}: attempt {} of {} failed ({}), retrying in {}ms",
                    label,
                    attempt,
                    attempts,
                    e,
                    wait.as_millis()
                );
                tokio::time::sleep(wait).await;
                attempt += 1;
            }
            Err(e) => {
                if e.is_retryable() {
                    tracing::warn!("{}: giving up after {} attempts: {}", label, attempt, e);
                }
                return Err(e);
            }
        }
    }
}
