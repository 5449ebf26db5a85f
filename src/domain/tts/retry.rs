use super::TtsError;
use rand::Rng;
use std::future::Future;
use std::time::Duration;

/// Total attempts, including the first one.
pub const MAX_ATTEMPTS: u32 = 3;
const BASE_DELAY_MS: u64 = 250;
const MAX_DELAY_MS: u64 = 4_000;
const MAX_JITTER_MS: u64 = 150;

/// Run one synthesis call with bounded exponential backoff.
///
/// Only transient failures (429, 5xx, timeout, network) are retried; other
/// errors return immediately. The delay doubles per attempt, is capped at
/// [`MAX_DELAY_MS`] and carries a random jitter. Exhaustion returns the last
/// error. The backoff sleep is a plain `tokio::time::sleep`, so dropping the
/// future cancels the wait rather than swallowing it.
pub async fn run_with_retry<T, F, Fut>(mut call: F) -> Result<T, TtsError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, TtsError>>,
{
    let mut attempts = 0u32;
    loop {
        match call().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                attempts += 1;
                if !err.is_transient() || attempts >= MAX_ATTEMPTS {
                    return Err(err);
                }
                let backoff = BASE_DELAY_MS << (attempts - 1);
                let jitter = rand::thread_rng().gen_range(0..MAX_JITTER_MS);
                let delay_ms = (backoff + jitter).min(MAX_DELAY_MS);
                tracing::debug!(
                    attempt = attempts,
                    delay_ms = delay_ms,
                    error = %err,
                    "transient synthesis failure, backing off"
                );
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
        }
    }
}
