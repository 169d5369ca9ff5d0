//! Bounded fixed-delay retry.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tokio::sync::watch;
use tracing::debug;

use crate::ticker::sleep_or_shutdown;

/// Attempt bound and inter-attempt delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub const fn fixed(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::fixed(crate::DEFAULT_DISCOVERY_ATTEMPTS, crate::DEFAULT_DISCOVERY_DELAY)
    }
}

/// How a retried operation ended.
#[derive(Debug)]
pub enum RetryOutcome<T, E> {
    /// An attempt succeeded; no further attempts were made.
    Succeeded { value: T, attempts: u32 },

    /// Every attempt failed.
    Exhausted { attempts: u32, last_error: Option<E> },

    /// Shutdown was signalled while waiting between attempts.
    Cancelled { attempts: u32, last_error: Option<E> },
}

/// Run `op` up to `policy.max_attempts` times, sleeping `policy.delay`
/// between failures. `op` receives the 1-based attempt number.
///
/// Returns on the first success. No sleep follows the final attempt.
pub async fn retry_fixed<T, E, F, Fut>(
    what: &str,
    policy: RetryPolicy,
    shutdown: &mut watch::Receiver<bool>,
    mut op: F,
) -> RetryOutcome<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let mut last_error = None;

    for attempt in 1..=policy.max_attempts {
        match op(attempt).await {
            Ok(value) => {
                return RetryOutcome::Succeeded {
                    value,
                    attempts: attempt,
                }
            }
            Err(e) => {
                debug!(
                    what,
                    attempt,
                    max_attempts = policy.max_attempts,
                    error = %e,
                    "Attempt failed"
                );
                last_error = Some(e);
            }
        }

        if attempt == policy.max_attempts {
            break;
        }
        if !sleep_or_shutdown(policy.delay, shutdown).await {
            return RetryOutcome::Cancelled {
                attempts: attempt,
                last_error,
            };
        }
    }

    RetryOutcome::Exhausted {
        attempts: policy.max_attempts,
        last_error,
    }
}
