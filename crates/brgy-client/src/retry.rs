//! Bounded retry with exponential backoff for gateway HTTP calls.
//!
//! Retries only when the connection could not be established, so the
//! gateway cannot have seen the request. Timeouts and failures after the
//! request went out are returned at once: resending a submission the gateway
//! may already have stored would create a duplicate. Any HTTP response,
//! whatever its status, is returned to the caller as is. With
//! `max_retries == 0` the request is sent exactly once.

use std::time::Duration;

/// Base delay between retries (doubles each attempt: 200ms, 400ms, 800ms).
const BASE_DELAY_MS: u64 = 200;

/// Upper bound on the backoff exponent so large retry counts stay sane.
const MAX_BACKOFF_EXPONENT: u32 = 5;

/// Send an HTTP request, retrying connect failures up to `max_retries`
/// times.
pub(crate) async fn retry_send<F, Fut>(
    max_retries: u32,
    f: F,
) -> Result<reqwest::Response, reqwest::Error>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = Result<reqwest::Response, reqwest::Error>>,
{
    for attempt in 0..max_retries {
        match f().await {
            Ok(resp) => return Ok(resp),
            Err(e) if !e.is_connect() => return Err(e),
            Err(e) => {
                let delay =
                    Duration::from_millis(BASE_DELAY_MS * 2u64.pow(attempt.min(MAX_BACKOFF_EXPONENT)));
                tracing::warn!(
                    attempt = attempt + 1,
                    max_retries,
                    "gateway request failed, retrying in {delay:?}: {e}"
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
    f().await
}
