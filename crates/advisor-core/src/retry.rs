//! Retry with exponential backoff for transient provider errors

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{Error, Result};

/// Configuration for retry behavior on provider calls
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    pub max_attempts: u32,
    /// Backoff before the second attempt; doubled on each further attempt
    pub base_delay: Duration,
    /// Hard timeout applied to every individual attempt
    pub attempt_timeout: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(250),
            attempt_timeout: Duration::from_secs(60),
        }
    }
}

/// Run `op` until it succeeds, a non-transient error surfaces, or
/// `max_attempts` is exhausted. Each attempt is bounded by
/// `attempt_timeout`; an elapsed timeout is treated as a transient
/// provider failure.
pub async fn with_retry<T, F, Fut>(config: &RetryConfig, label: &str, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut delay = config.base_delay;
    let mut attempt = 1;
    loop {
        let result = match tokio::time::timeout(config.attempt_timeout, op()).await {
            Ok(result) => result,
            Err(_) => Err(Error::Timeout(format!(
                "{} did not complete within {:?}",
                label, config.attempt_timeout
            ))),
        };

        match result {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() && attempt < config.max_attempts => {
                warn!(
                    attempt,
                    max_attempts = config.max_attempts,
                    error = %e,
                    "{} failed, retrying after {:?}",
                    label,
                    delay
                );
                tokio::time::sleep(delay).await;
                delay *= 2;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
