//! # Retry Policy
//!
//! Exponential backoff for transient request failures.
//!
//! ```text
//! attempt 0 ──fail(retryable)──► wait ~initial ──► attempt 1 ──fail──► wait ~2x ...
//!     │                                                │
//!     └──fail(permanent)──► return error               └──► give up after max_retries
//! ```

use backoff::backoff::Backoff;
use backoff::ExponentialBackoff;
use datama_core::Table;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

use crate::config::HttpSettings;
use crate::error::ClientResult;

/// How often and how patiently to repeat a failed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt. 0 disables retry.
    pub max_retries: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl RetryPolicy {
    pub fn from_settings(settings: &HttpSettings) -> Self {
        RetryPolicy {
            max_retries: settings.max_retries,
            initial_backoff: Duration::from_millis(settings.initial_backoff_ms),
            max_backoff: Duration::from_secs(settings.max_backoff_secs),
        }
    }

    /// A policy that never retries.
    pub fn none() -> Self {
        RetryPolicy {
            max_retries: 0,
            initial_backoff: Duration::ZERO,
            max_backoff: Duration::ZERO,
        }
    }

    /// Runs `op` until it succeeds, fails permanently, or retries run out.
    pub async fn run<T, F, Fut>(&self, table: Table, mut op: F) -> ClientResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = ClientResult<T>>,
    {
        let mut backoff = self.create_backoff();
        let mut attempt = 0u32;

        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    attempt += 1;
                    let delay = backoff.next_backoff().unwrap_or(self.max_backoff);
                    warn!(
                        %table,
                        attempt,
                        max_retries = self.max_retries,
                        ?delay,
                        error = %e,
                        "Request failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn create_backoff(&self) -> ExponentialBackoff {
        ExponentialBackoff {
            current_interval: self.initial_backoff,
            initial_interval: self.initial_backoff,
            max_interval: self.max_backoff,
            multiplier: 2.0,
            max_elapsed_time: None,
            ..Default::default()
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_settings(&HttpSettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClientError;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn fast(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            initial_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(5),
        }
    }

    #[tokio::test]
    async fn test_retries_transient_then_succeeds() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result = fast(3)
            .run(Table::Item, || {
                let counter = counter.clone();
                async move {
                    if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                        Err(ClientError::ConnectionFailed("reset".into()))
                    } else {
                        Ok(7)
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_permanent_error_not_retried() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result: ClientResult<()> = fast(3)
            .run(Table::Customer, || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err(ClientError::from_response(Table::Customer, 401, ""))
                }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_retries() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result: ClientResult<()> = fast(2)
            .run(Table::Payment, || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err(ClientError::Timeout(1))
                }
            })
            .await;

        assert_eq!(result.unwrap_err(), ClientError::Timeout(1));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_first_delay_follows_initial_backoff() {
        let policy = RetryPolicy {
            max_retries: 2,
            initial_backoff: Duration::from_millis(200),
            max_backoff: Duration::from_secs(5),
        };
        let mut backoff = policy.create_backoff();
        let spread = backoff.randomization_factor;

        let first = backoff.next_backoff().unwrap();

        let low = Duration::from_millis(200).mul_f64(1.0 - spread) - Duration::from_millis(1);
        let high = Duration::from_millis(200).mul_f64(1.0 + spread) + Duration::from_millis(1);
        assert!(first >= low && first <= high, "first delay {:?}", first);
    }

    #[test]
    fn test_delay_capped_at_max_backoff() {
        let mut backoff = fast(5).create_backoff();
        for _ in 0..10 {
            let delay = backoff.next_backoff().unwrap();
            let ceiling = Duration::from_millis(5).mul_f64(1.0 + backoff.randomization_factor);
            assert!(delay <= ceiling + Duration::from_millis(1), "delay {:?}", delay);
        }
    }

    #[test]
    fn test_policy_from_settings() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retries, 2);
        assert_eq!(policy.initial_backoff, Duration::from_millis(200));
        assert_eq!(policy.max_backoff, Duration::from_secs(5));
        assert_eq!(RetryPolicy::none().max_retries, 0);
    }
}
