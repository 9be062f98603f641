//! Fixed-interval polling.
//!
//! Every gate wait is a repeated predicate check on a timer rather than a
//! blocking primitive, so an interruption is noticed between checks.

use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// How a poll loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    Ready,
    TimedOut,
    Cancelled,
}

/// Check `ready` now and then once per `interval` until it returns `true`,
/// `deadline` passes, or `cancel` fires.
pub async fn poll_until<F>(
    mut ready: F,
    interval: Duration,
    deadline: Option<Instant>,
    cancel: &CancellationToken,
) -> WaitOutcome
where
    F: FnMut() -> bool,
{
    loop {
        if ready() {
            return WaitOutcome::Ready;
        }
        let mut wake = Instant::now() + interval;
        if let Some(deadline) = deadline {
            if Instant::now() >= deadline {
                return WaitOutcome::TimedOut;
            }
            wake = wake.min(deadline);
        }
        tokio::select! {
            _ = cancel.cancelled() => return WaitOutcome::Cancelled,
            _ = tokio::time::sleep_until(wake) => {
                tracing::debug!("Re-checking after {}s", interval.as_secs());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn ready_immediately() {
        let started = tokio::time::Instant::now();
        let outcome = poll_until(|| true, Duration::from_secs(60), None, &CancellationToken::new()).await;
        assert_eq!(outcome, WaitOutcome::Ready);
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn checks_on_each_interval() {
        let mut checks = 0;
        let started = tokio::time::Instant::now();
        let outcome = poll_until(
            || {
                checks += 1;
                checks == 4
            },
            Duration::from_secs(300),
            None,
            &CancellationToken::new(),
        )
        .await;
        assert_eq!(outcome, WaitOutcome::Ready);
        assert_eq!(checks, 4);
        assert_eq!(started.elapsed(), Duration::from_secs(900));
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_while_waiting() {
        let token = CancellationToken::new();
        token.cancel();
        let outcome = poll_until(|| false, Duration::from_secs(300), None, &token).await;
        assert_eq!(outcome, WaitOutcome::Cancelled);
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_ends_wait() {
        let started = Instant::now();
        let outcome = poll_until(
            || false,
            Duration::from_secs(300),
            Some(started + Duration::from_secs(700)),
            &CancellationToken::new(),
        )
        .await;
        assert_eq!(outcome, WaitOutcome::TimedOut);
        assert_eq!(started.elapsed(), Duration::from_secs(700));
    }
}
