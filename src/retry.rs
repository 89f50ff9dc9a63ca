use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

/// Fixed exponential backoff: waits `initial_backoff * 2^n` after the n-th
/// failed attempt, and never after the last one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub initial_backoff: Duration,
}

impl RetryPolicy {
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.initial_backoff.saturating_mul(factor)
    }

    /// Waits between consecutive attempts.
    pub fn delays(&self) -> impl Iterator<Item = Duration> + '_ {
        let waits = self.attempts.saturating_sub(1);
        (0..waits).map(move |attempt| self.backoff(attempt))
    }
}

/// Run `operation` until it succeeds or the policy runs out of attempts,
/// returning the last error. The first attempt always runs.
pub async fn retry<T, E, F, Fut>(policy: &RetryPolicy, mut operation: F) -> Result<T, E>
where
    E: Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut attempt = 0;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) if attempt + 1 < policy.attempts => {
                let backoff = policy.backoff(attempt);
                tracing::warn!(
                    attempt = attempt + 1,
                    backoff_ms = backoff.as_millis() as u64,
                    error.message = %err,
                    "Attempt failed, retrying"
                );
                tokio::time::sleep(backoff).await;
                attempt += 1;
            }
            Err(err) => {
                tracing::error!(
                    attempts = attempt + 1,
                    error.message = %err,
                    "Max attempts reached"
                );
                return Err(err);
            }
        }
    }
}
