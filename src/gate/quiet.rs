//! Quiet-time window arithmetic.

use std::time::Duration;

use chrono::Timelike;
use tokio_util::sync::CancellationToken;

use super::clock::Clock;
use super::wait::{poll_until, WaitOutcome};

/// How often a job waiting out quiet time re-checks the hour.
pub const QUIET_POLL_INTERVAL: Duration = Duration::from_secs(15 * 60);

/// Hours during which no job may start, as `[start, end)` local hours.
/// A window whose start is after its end wraps past midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuietWindow {
    start: u32,
    end: u32,
}

impl QuietWindow {
    /// Parse `"SS-EE"`. Returns `None` unless both sides are two-digit hours
    /// in `00..=23`.
    pub fn parse(s: &str) -> Option<Self> {
        let (start, end) = s.trim().split_once('-')?;
        Some(Self {
            start: parse_hour(start)?,
            end: parse_hour(end)?,
        })
    }

    /// The window configured for a job, or `None` when no quiet time
    /// applies: the check is ignored, the value is unset or malformed, or
    /// both hours are equal.
    pub fn from_config(config: &dvr_core::Config) -> Option<Self> {
        if config.ignore_quiet_time {
            return None;
        }
        let raw = config.quiet_time.as_deref()?;
        match Self::parse(raw) {
            Some(window) if window.start != window.end => Some(window),
            Some(_) => None,
            None => {
                tracing::debug!("Ignoring quiet-time '{raw}'");
                None
            }
        }
    }

    pub fn is_quiet(&self, hour: u32) -> bool {
        if self.start > self.end {
            hour >= self.start || hour < self.end
        } else {
            hour >= self.start && hour < self.end
        }
    }
}

impl std::fmt::Display for QuietWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}-{:02}", self.start, self.end)
    }
}

fn parse_hour(s: &str) -> Option<u32> {
    if s.len() != 2 || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok().filter(|h| *h < 24)
}

/// Block until the clock leaves the quiet window, re-checking every
/// `interval`.
pub async fn wait_out(
    window: QuietWindow,
    clock: &dyn Clock,
    interval: Duration,
    cancel: &CancellationToken,
) -> dvr_core::Result<()> {
    let quiet_now = || window.is_quiet(clock.now().hour());
    if !quiet_now() {
        return Ok(());
    }

    tracing::info!("Quiet time ({window}) is in effect; checking again every {} min", interval.as_secs() / 60);
    match poll_until(|| !quiet_now(), interval, None, cancel).await {
        WaitOutcome::Ready => {
            tracing::info!("Quiet time is over, moving on");
            Ok(())
        }
        WaitOutcome::Cancelled => Err(dvr_core::Error::Interrupted),
        WaitOutcome::TimedOut => Err(dvr_core::Error::Internal("quiet-time wait timed out".into())),
    }
}
