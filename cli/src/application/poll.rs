//! Bounded polling: observe, test, sleep, repeat until success or deadline.

use std::future::Future;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::domain::poll::{PollConfig, PollOutcome, PollResult};

/// Poll `observe` until `is_success` holds for its value, the deadline in
/// `config` passes, or `cancel` fires.
///
/// The first observation runs immediately. After a failed observation the
/// task sleeps for one interval; the deadline is checked after waking, so a
/// poll may overshoot the timeout by up to one interval and a timeout shorter
/// than the interval gives exactly one observation.
///
/// Failures inside `observe` are the caller's to model as part of `T`
/// (`Option`, `Result`, a domain enum). This function always returns the
/// last observed value and never fails.
pub async fn poll_until<T, F, Fut, P>(
    mut observe: F,
    is_success: P,
    config: &PollConfig,
    cancel: Option<&CancellationToken>,
) -> PollResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = T>,
    P: Fn(&T) -> bool,
{
    let start = Instant::now();
    let mut attempts: u32 = 0;

    loop {
        let value = observe().await;
        attempts = attempts.saturating_add(1);

        if is_success(&value) {
            debug!(attempts, elapsed_ms = start.elapsed().as_millis(), "poll succeeded");
            return finish(PollOutcome::Succeeded, value, start, attempts);
        }

        if config.max_attempts().is_some_and(|max| attempts >= max) {
            debug!(attempts, "poll attempt budget exhausted");
            return finish(PollOutcome::TimedOut, value, start, attempts);
        }

        debug!(attempts, interval_ms = config.interval().as_millis(), "condition not met, waiting");
        let cancelled = match cancel {
            Some(token) => tokio::select! {
                biased;
                () = token.cancelled() => true,
                () = tokio::time::sleep(config.interval()) => false,
            },
            None => {
                tokio::time::sleep(config.interval()).await;
                false
            }
        };

        if cancelled {
            debug!(attempts, "poll cancelled");
            return finish(PollOutcome::Cancelled, value, start, attempts);
        }
        if start.elapsed() >= config.timeout() {
            debug!(attempts, timeout_ms = config.timeout().as_millis(), "poll timed out");
            return finish(PollOutcome::TimedOut, value, start, attempts);
        }
    }
}

fn finish<T>(outcome: PollOutcome, last_observed: T, start: Instant, attempts: u32) -> PollResult<T> {
    PollResult {
        outcome,
        last_observed,
        elapsed: start.elapsed(),
        attempts,
    }
}
