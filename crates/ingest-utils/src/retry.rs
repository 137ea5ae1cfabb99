use std::{future::Future, time::Duration};

use tokio_util::sync::CancellationToken;

/// Exponential-backoff parameters for "transaction not yet available"
/// retries (§4.8, §8 P10): initial delay 500 ms, multiplier 2.0, capped at
/// 5 s, at most 3 retries.
#[derive(Debug, Clone, Copy)]
pub struct BackoffConfig {
    pub initial: Duration,
    pub multiplier: f64,
    pub cap: Duration,
    pub max_retries: u32,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            initial: Duration::from_millis(500),
            multiplier: 2.0,
            cap: Duration::from_secs(5),
            max_retries: 3,
        }
    }
}

/// The source's coarse "is this a not-yet-available error" check,
/// encapsulated in one place per §9 so a future adapter swap only has to
/// satisfy this predicate, not reinvent it. Case-insensitive substring
/// match on `"not found"`.
pub fn is_not_found(message: &str) -> bool {
    message.to_ascii_lowercase().contains("not found")
}

/// Runs `op` until it succeeds, a non-retryable error is returned, the
/// retry budget is exhausted, or `token` is cancelled.
///
/// `should_retry` decides, from the error alone, whether another attempt
/// is worthwhile (§4.8: only "not found" is retried; every other error
/// propagates immediately). Exhausting retries or observing cancellation
/// both return the last error — retry policy is silent about *why* the
/// caller gave up and leaves that to the caller's own logging.
pub async fn retry_with_backoff<F, Fut, T, E>(
    mut op: F,
    should_retry: impl Fn(&E) -> bool,
    config: BackoffConfig,
    token: &CancellationToken,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut delay = config.initial;
    let mut attempt = 0u32;

    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if attempt >= config.max_retries || !should_retry(&err) || token.is_cancelled() {
                    return Err(err);
                }

                if !crate::cancel::sleep_cancellable(delay, token).await {
                    return Err(err);
                }

                attempt += 1;
                delay = std::cmp::min(
                    Duration::from_secs_f64(delay.as_secs_f64() * config.multiplier),
                    config.cap,
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    #[test]
    fn not_found_predicate_is_case_insensitive_substring() {
        assert!(is_not_found("Transaction NOT FOUND after retries"));
        assert!(is_not_found("not found"));
        assert!(!is_not_found("invalid pubkey"));
    }

    #[tokio::test]
    async fn retries_until_success_within_budget() {
        let attempts = AtomicU32::new(0);
        let token = CancellationToken::new();

        let result = retry_with_backoff(
            || async {
                let n = attempts.fetch_add(1, Ordering::SeqCst);
                if n < 2 {
                    Err("not found".to_string())
                } else {
                    Ok(42)
                }
            },
            |e: &String| is_not_found(e),
            BackoffConfig { initial: Duration::from_millis(1), cap: Duration::from_millis(4), ..Default::default() },
            &token,
        )
        .await;

        assert_eq!(result, Ok(42));
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn non_retryable_error_propagates_immediately() {
        let attempts = AtomicU32::new(0);
        let token = CancellationToken::new();

        let result: Result<i32, String> = retry_with_backoff(
            || async {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err("invalid pubkey".to_string())
            },
            |e: &String| is_not_found(e),
            BackoffConfig { initial: Duration::from_millis(1), ..Default::default() },
            &token,
        )
        .await;

        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn exhausting_retries_returns_last_error() {
        let attempts = AtomicU32::new(0);
        let token = CancellationToken::new();

        let result: Result<i32, String> = retry_with_backoff(
            || async {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err("not found".to_string())
            },
            |e: &String| is_not_found(e),
            BackoffConfig { initial: Duration::from_millis(1), cap: Duration::from_millis(2), max_retries: 3, ..Default::default() },
            &token,
        )
        .await;

        assert!(result.is_err());
        // initial attempt + 3 retries
        assert_eq!(attempts.load(Ordering::SeqCst), 4);
    }
}
