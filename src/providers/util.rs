use anyhow::Error;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// Attempts made after the first failure of a request.
pub const REQUEST_RETRIES: usize = 2;
pub const RETRY_DELAY_MS: u64 = 300;

/// Runs `operation` until it succeeds or `retries` extra attempts have failed,
/// sleeping `delay_ms` between attempts. Only transport errors are retried;
/// an HTTP error status is a successful send.
pub async fn with_retry<F, Fut, T>(
    mut operation: F,
    retries: usize,
    delay_ms: u64,
) -> Result<T, Error>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, reqwest::Error>>,
{
    let mut attempt = 0;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) if attempt < retries => {
                attempt += 1;
                debug!("Attempt {}/{} failed: {}. Retrying...", attempt, retries + 1, err);
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
            Err(err) => return Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_gives_up_after_retries() {
        let calls = AtomicUsize::new(0);
        // Nothing listens on port 9 of localhost, so every send fails fast.
        let result = with_retry(
            || {
                calls.fetch_add(1, Ordering::SeqCst);
                reqwest::get("http://127.0.0.1:9/")
            },
            2,
            1,
        )
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_success_needs_one_attempt() {
        let server = wiremock::MockServer::start().await;
        let calls = AtomicUsize::new(0);
        let url = server.uri();
        let result = with_retry(
            || {
                calls.fetch_add(1, Ordering::SeqCst);
                reqwest::get(url.as_str())
            },
            2,
            1,
        )
        .await;
        assert!(result.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
