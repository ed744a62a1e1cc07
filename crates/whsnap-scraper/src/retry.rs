//! Retry with capped exponential backoff for transport-level failures.
//!
//! Only connection and timeout errors are retried. A well-formed response,
//! even an error response, is returned to the caller on the first attempt.

use std::future::Future;
use std::time::Duration;

use crate::error::ScraperError;

/// Attempt budget and backoff schedule for one logical request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. `0` is treated as `1`.
    pub max_attempts: u32,
    pub backoff_base_secs: u64,
    pub backoff_cap_secs: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_base_secs: 1,
            backoff_cap_secs: 8,
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `retry` (0-based): `base * 2^retry`, capped.
    #[must_use]
    pub fn delay_secs(&self, retry: u32) -> u64 {
        self.backoff_base_secs
            .saturating_mul(1u64 << retry.min(62))
            .min(self.backoff_cap_secs)
    }
}

/// Returns `true` for connection and timeout failures.
///
/// Non-retriable:
/// - [`ScraperError::Unauthorized`] / [`ScraperError::UnexpectedStatus`]: the
///   server answered; asking again returns the same answer.
/// - [`ScraperError::Deserialize`]: malformed body; retrying won't fix it.
/// - `Http` errors raised while decoding a body or following redirects.
pub(crate) fn is_retriable(err: &ScraperError) -> bool {
    match err {
        ScraperError::Http(e) => e.is_timeout() || e.is_connect(),
        _ => false,
    }
}

/// Runs `operation` until it succeeds, fails with a non-retriable error, or
/// `policy.max_attempts` is spent. The last error is returned.
///
/// # Backoff schedule (base 1 s, cap 8 s)
///
/// | Retry | Sleep before it |
/// |-------|-----------------|
/// | 1     | 1 s             |
/// | 2     | 2 s             |
/// | 3     | 4 s             |
/// | 4+    | 8 s             |
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    policy: RetryPolicy,
    mut operation: F,
) -> Result<T, ScraperError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ScraperError>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1u32;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !is_retriable(&err) || attempt >= max_attempts {
                    return Err(err);
                }
                let delay_secs = policy.delay_secs(attempt - 1);
                tracing::warn!(
                    attempt,
                    max_attempts,
                    delay_secs,
                    error = %err,
                    "transport error; retrying after backoff"
                );
                tokio::time::sleep(Duration::from_secs(delay_secs)).await;
                attempt += 1;
            }
        }
    }
}
