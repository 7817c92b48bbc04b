// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use std::{fmt::Display, future::Future, time::Duration};
use tokio::time::sleep;
use tracing::{error, warn};

/// Tells [`retry_with_backoff`] whether a failed attempt is worth repeating.
pub enum RetryError<E> {
    Failure(E),
    Retry(E),
}

impl<E> RetryError<E> {
    pub fn into_inner(self) -> E {
        match self {
            RetryError::Failure(e) | RetryError::Retry(e) => e,
        }
    }
}

pub const BACKOFF_DELAY: u64 = 500;
pub const BACKOFF_MAX_RETRIES: u32 = 3;

/// Retries an async operation with exponential backoff
///
/// Only use this for idempotent work such as ledger reads. State changing
/// transactions must never be resubmitted blindly.
///
/// # Arguments
/// * `operation` - Async function to retry
/// * `max_attempts` - Maximum number of attempts (including the first)
/// * `initial_delay_ms` - Initial delay between retries in milliseconds
///
/// # Returns
/// * `Result<T, E>` - the first success, or the last error once attempts are exhausted
pub async fn retry_with_backoff<F, Fut, T, E>(
    operation: F,
    max_attempts: u32,
    initial_delay_ms: u64,
) -> Result<T, E>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, RetryError<E>>>,
    E: Display,
{
    let mut current_attempt = 1;
    let mut delay_ms = initial_delay_ms;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(RetryError::Retry(e)) => {
                if current_attempt >= max_attempts {
                    error!("Operation failed after {} attempts: {}", max_attempts, e);
                    return Err(e);
                }

                warn!(
                    "Attempt {}/{} failed, retrying in {}ms: {}",
                    current_attempt, max_attempts, delay_ms, e
                );

                sleep(Duration::from_millis(delay_ms)).await;
                current_attempt += 1;
                delay_ms *= 2; // Exponential backoff
            }
            Err(RetryError::Failure(e)) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test(start_paused = true)]
    async fn test_retries_until_success() {
        let attempts = AtomicU32::new(0);
        let result: Result<u32, String> = retry_with_backoff(
            || async {
                let n = attempts.fetch_add(1, Ordering::SeqCst) + 1;
                if n < 3 {
                    Err(RetryError::Retry(format!("attempt {n}")))
                } else {
                    Ok(n)
                }
            },
            3,
            10,
        )
        .await;

        assert_eq!(result, Ok(3));
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_is_not_retried() {
        let attempts = AtomicU32::new(0);
        let result: Result<(), String> = retry_with_backoff(
            || async {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err(RetryError::Failure("reverted".to_string()))
            },
            5,
            10,
        )
        .await;

        assert_eq!(result, Err("reverted".to_string()));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_max_attempts() {
        let attempts = AtomicU32::new(0);
        let result: Result<(), String> = retry_with_backoff(
            || async {
                let n = attempts.fetch_add(1, Ordering::SeqCst) + 1;
                Err(RetryError::Retry(format!("timeout {n}")))
            },
            3,
            10,
        )
        .await;

        assert_eq!(result, Err("timeout 3".to_string()));
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }
}
