//! HTTP retry helper for provider calls.

use reqwest::StatusCode;
use std::time::Duration;
use tracing::warn;

const MAX_BACKOFF: Duration = Duration::from_secs(60);

/// Retry a request closure with exponential backoff.
///
/// Retries on network errors, 429 (honoring a numeric Retry-After header),
/// and 5xx. Other error statuses are returned to the caller immediately;
/// they are almost always permanent (bad key, bad request).
pub async fn request_with_retry<F, Fut>(
    mut task: F,
    max_retries: u32,
) -> Result<reqwest::Response, String>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<reqwest::Response, reqwest::Error>>,
{
    let mut attempt = 0;
    let mut delay = Duration::from_millis(1000);

    loop {
        attempt += 1;
        match task().await {
            Ok(response) => {
                let status = response.status();
                if status.is_success() || attempt > max_retries {
                    return Ok(response);
                }

                if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
                    let retry_delay = response
                        .headers()
                        .get("retry-after")
                        .and_then(|v| v.to_str().ok())
                        .and_then(|v| v.parse::<u64>().ok())
                        .map(Duration::from_secs)
                        .unwrap_or(delay);

                    warn!(
                        "request failed with status {}, retrying in {:?} (attempt {}/{})",
                        status, retry_delay, attempt, max_retries
                    );
                    tokio::time::sleep(retry_delay).await;
                    delay = (delay * 2).min(MAX_BACKOFF);
                    continue;
                }

                return Ok(response);
            }
            Err(e) => {
                if attempt > max_retries {
                    return Err(format!(
                        "network request failed after {} attempts: {}",
                        attempt, e
                    ));
                }
                warn!(
                    "network error: {}, retrying in {:?} (attempt {}/{})",
                    e, delay, attempt, max_retries
                );
                tokio::time::sleep(delay).await;
                delay = (delay * 2).min(MAX_BACKOFF);
            }
        }
    }
}
