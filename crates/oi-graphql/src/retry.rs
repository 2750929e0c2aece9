//! Retry with exponential back-off and jitter for idempotent GraphQL queries.
//!
//! Mutations never go through here: re-sending `fullCrawlAndStore` after a
//! timeout could start a second crawl while the first is still running.

use std::future::Future;
use std::time::Duration;

use crate::error::TransportError;

/// Returns `true` for errors that are worth retrying after a back-off delay.
///
/// **Retriable:** timeouts, connection failures and HTTP 5xx.
///
/// **Not retriable:** GraphQL-level errors, malformed bodies, missing data,
/// 4xx statuses. Retrying would return the same answer.
pub(crate) fn is_retriable(err: &TransportError) -> bool {
    match err {
        TransportError::Http(e) => {
            e.is_timeout() || e.is_connect() || e.status().is_some_and(|s| s.is_server_error())
        }
        TransportError::UnexpectedStatus { status, .. } => *status >= 500,
        TransportError::Deserialize { .. }
        | TransportError::Graphql { .. }
        | TransportError::MissingData { .. }
        | TransportError::Timeout { .. }
        | TransportError::InvalidEndpoint { .. } => false,
    }
}

/// Back-off settings for idempotent queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct RetryPolicy {
    /// Attempts after the first failure.
    pub(crate) max_retries: u32,
    pub(crate) base_ms: u64,
}

impl RetryPolicy {
    const MAX_DELAY_MS: u64 = 30_000;

    /// Sleep before retry number `retry` (1-based).
    ///
    /// The base doubles per retry and is capped at 30 s before jitter.
    /// `jitter` is a sample from `[0, 1)` and scales the delay into
    /// `[0.75, 1.25)` of the capped value.
    pub(crate) fn delay(self, retry: u32, jitter: f64) -> Duration {
        let doublings = retry.saturating_sub(1).min(16);
        let capped = self
            .base_ms
            .saturating_mul(1u64 << doublings)
            .min(Self::MAX_DELAY_MS);
        let factor = 0.75 + jitter.clamp(0.0, 1.0) * 0.5;
        #[allow(
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            clippy::cast_precision_loss
        )]
        let millis = (capped as f64 * factor).round() as u64;
        Duration::from_millis(millis)
    }
}

/// Sends a query, re-sending it while it fails with a retriable error and
/// the policy has retries left. The last error is returned as is.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    operation_name: &str,
    policy: RetryPolicy,
    mut send: F,
) -> Result<T, TransportError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, TransportError>>,
{
    let mut retry = 0u32;
    loop {
        let err = match send().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };
        if retry == policy.max_retries || !is_retriable(&err) {
            return Err(err);
        }
        retry += 1;
        let delay = policy.delay(retry, rand::random::<f64>());
        tracing::warn!(
            operation = operation_name,
            retry,
            max_retries = policy.max_retries,
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            error = %err,
            "query failed, sending again after back-off"
        );
        tokio::time::sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    use super::*;

    fn no_wait(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            base_ms: 0,
        }
    }

    fn server_error() -> TransportError {
        TransportError::UnexpectedStatus {
            status: 503,
            url: "http://localhost:8080/".to_owned(),
        }
    }

    #[test]
    fn graphql_error_is_not_retriable() {
        assert!(!is_retriable(&TransportError::Graphql {
            operation: "Scan".to_owned(),
            messages: vec!["boom".to_owned()],
        }));
    }

    #[test]
    fn client_error_status_is_not_retriable() {
        assert!(!is_retriable(&TransportError::UnexpectedStatus {
            status: 400,
            url: "http://localhost:8080/".to_owned(),
        }));
    }

    #[test]
    fn server_error_status_is_retriable() {
        assert!(is_retriable(&server_error()));
    }

    #[test]
    fn delay_doubles_per_retry_around_the_base() {
        let policy = RetryPolicy {
            max_retries: 5,
            base_ms: 500,
        };
        assert_eq!(policy.delay(1, 0.5), Duration::from_millis(500));
        assert_eq!(policy.delay(2, 0.5), Duration::from_millis(1_000));
        assert_eq!(policy.delay(3, 0.5), Duration::from_millis(2_000));
        assert_eq!(policy.delay(1, 0.0), Duration::from_millis(375));
        assert_eq!(policy.delay(1, 0.999), Duration::from_millis(625));
    }

    #[test]
    fn delay_is_capped_before_jitter() {
        let policy = RetryPolicy {
            max_retries: 20,
            base_ms: 500,
        };
        assert_eq!(policy.delay(7, 0.5), Duration::from_secs(30));
        assert_eq!(policy.delay(7, 0.0), Duration::from_millis(22_500));
        assert_eq!(policy.delay(u32::MAX, 0.5), Duration::from_secs(30));
    }

    #[test]
    fn huge_base_saturates_instead_of_overflowing() {
        let policy = RetryPolicy {
            max_retries: 3,
            base_ms: u64::MAX,
        };
        assert_eq!(policy.delay(3, 0.5), Duration::from_secs(30));
    }

    #[test]
    fn out_of_range_jitter_is_clamped() {
        let policy = RetryPolicy {
            max_retries: 1,
            base_ms: 1_000,
        };
        assert_eq!(policy.delay(1, -3.0), Duration::from_millis(750));
        assert_eq!(policy.delay(1, 7.0), Duration::from_millis(1_250));
    }

    #[tokio::test]
    async fn zero_retries_sends_once() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff("Scan", no_wait(0), || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err::<u32, _>(server_error())
            }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn succeeds_immediately_on_first_try() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff("Scan", no_wait(3), || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Ok::<u32, TransportError>(42)
            }
        })
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retries_server_errors_then_succeeds() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff("Scan", no_wait(3), || {
            let c = Arc::clone(&c);
            async move {
                let attempt = c.fetch_add(1, Ordering::SeqCst) + 1;
                if attempt < 3 {
                    Err(server_error())
                } else {
                    Ok(99)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 99);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn returns_last_error_after_exhausting_retries() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff("Scan", no_wait(2), || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err::<u32, _>(server_error())
            }
        })
        .await;
        // max_retries=2 → 3 total attempts
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(matches!(
            result,
            Err(TransportError::UnexpectedStatus { status: 503, .. })
        ));
    }

    #[tokio::test]
    async fn does_not_retry_graphql_errors() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff("Scan", no_wait(3), || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err::<u32, _>(TransportError::Graphql {
                    operation: "Scan".to_owned(),
                    messages: vec!["db unavailable".to_owned()],
                })
            }
        })
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(result, Err(TransportError::Graphql { .. })));
    }
}
