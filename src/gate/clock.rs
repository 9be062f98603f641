//! Wall-clock source for the gate.

use chrono::{DateTime, Local};

/// Supplies the current local time. The gate reads the hour for quiet-time
/// checks and compares lock file ages against it.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Local>;
}

/// The real system clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// A clock that starts at a fixed time and moves with tokio's clock, so
/// paused-time tests can step through hours of waiting.
#[cfg(test)]
#[derive(Debug, Clone, Copy)]
pub struct TestClock {
    start: DateTime<Local>,
    origin: tokio::time::Instant,
}

#[cfg(test)]
impl TestClock {
    pub fn at(start: DateTime<Local>) -> Self {
        Self {
            start,
            origin: tokio::time::Instant::now(),
        }
    }

    /// Today at `hour:00` local time.
    pub fn at_hour(hour: u32) -> Self {
        use chrono::{NaiveTime, TimeZone};
        let time = NaiveTime::from_hms_opt(hour, 0, 0).unwrap();
        let naive = Local::now().date_naive().and_time(time);
        Self::at(Local.from_local_datetime(&naive).earliest().unwrap())
    }
}

#[cfg(test)]
impl Clock for TestClock {
    fn now(&self) -> DateTime<Local> {
        let elapsed = tokio::time::Instant::now().duration_since(self.origin);
        self.start + chrono::Duration::from_std(elapsed).unwrap()
    }
}
