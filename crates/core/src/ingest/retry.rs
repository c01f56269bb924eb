use crate::config::FetchSettings;
use crate::ingest::error::{FetchFailure, UpstreamError, UpstreamErrorKind};
use std::future::Future;
use std::time::Duration;

/// Bounded retries with linear backoff: the wait after attempt `n` is `base_delay * n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    /// Extra factor applied to the backoff when the upstream reports rate limiting.
    pub rate_limit_multiplier: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(FetchSettings::default())
    }
}

impl From<FetchSettings> for RetryPolicy {
    fn from(s: FetchSettings) -> Self {
        Self {
            max_attempts: s.max_attempts.max(1),
            base_delay: s.base_delay,
            rate_limit_multiplier: s.rate_limit_multiplier.max(1),
        }
    }
}

impl RetryPolicy {
    pub fn backoff(&self, attempt: u32, kind: UpstreamErrorKind) -> Duration {
        let factor = if kind == UpstreamErrorKind::RateLimited {
            attempt.saturating_mul(self.rate_limit_multiplier)
        } else {
            attempt
        };
        self.base_delay.saturating_mul(factor)
    }
}

/// Runs `op` until it succeeds, fails with a non-retryable error, or `max_attempts` is reached.
/// `op` receives the 1-based attempt number.
pub async fn with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    label: &str,
    mut op: F,
) -> Result<T, FetchFailure>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, UpstreamError>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt: u32 = 0;
    loop {
        attempt += 1;
        match op(attempt).await {
            Ok(value) => {
                if attempt > 1 {
                    tracing::info!(attempt, %label, "fetch succeeded after retry");
                }
                return Ok(value);
            }
            Err(err) if !err.is_retryable() => {
                tracing::warn!(attempt, %label, error = %err, "fetch failed; not retryable");
                return Err(FetchFailure::NonRetryable {
                    attempts: attempt,
                    error: err,
                });
            }
            Err(err) => {
                if attempt >= max_attempts {
                    tracing::warn!(
                        attempt,
                        %label,
                        error = %err,
                        "fetch failed; retries exhausted"
                    );
                    return Err(FetchFailure::TransientFetchFailure {
                        attempts: attempt,
                        last: err,
                    });
                }
                let backoff = policy.backoff(attempt, err.kind);
                tracing::warn!(attempt, ?backoff, %label, error = %err, "fetch failed; retrying");
                tokio::time::sleep(backoff).await;
            }
        }
    }
}
