//! # Cancellable backoff-paced polling.
//!
//! [`retry_until`] blocks its caller (cooperatively — the task suspends, no
//! OS thread is parked) re-evaluating a condition with non-decreasing delays
//! until the condition holds, the attempt limit is exhausted, or the
//! cancellation token fires.
//!
//! ## Rules
//! - The condition is evaluated **immediately** on entry, before any sleep.
//! - Delays between evaluations come from [`BackoffPolicy::next`] indexed by
//!   attempt number, so they never shrink (apart from configured jitter).
//! - Cancellation is checked before every evaluation **and** interrupts the
//!   sleep itself, so an abort is prompt even mid-delay.

use tokio::time;
use tokio_util::sync::CancellationToken;

use crate::error::RetryError;
use crate::policies::BackoffPolicy;

/// Re-evaluates `condition` until it returns `true`.
///
/// Returns the number of *failed* evaluations that preceded success (so an
/// immediately-true condition returns `Ok(0)`).
///
/// ### Parameters
/// - `backoff`: delay schedule between evaluations
/// - `token`: aborts the wait promptly when cancelled
/// - `limit`: maximum number of evaluations; `None` retries indefinitely
/// - `condition`: the predicate to wait on; must not block
pub async fn retry_until<F>(
    backoff: &BackoffPolicy,
    token: &CancellationToken,
    limit: Option<u32>,
    mut condition: F,
) -> Result<u32, RetryError>
where
    F: FnMut() -> bool,
{
    let mut attempt: u32 = 0;

    loop {
        if token.is_cancelled() {
            return Err(RetryError::Cancelled);
        }
        if condition() {
            return Ok(attempt);
        }

        attempt = attempt.saturating_add(1);
        if let Some(max) = limit {
            if attempt >= max {
                return Err(RetryError::Exhausted { attempts: attempt });
            }
        }

        let delay = backoff.next(attempt - 1);
        let sleep = time::sleep(delay);
        tokio::pin!(sleep);
        tokio::select! {
            _ = &mut sleep => {}
            _ = token.cancelled() => return Err(RetryError::Cancelled),
        }
    }
}
