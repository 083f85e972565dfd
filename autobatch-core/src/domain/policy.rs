//! Run policy
//!
//! Deadline, polling cadence and failure tolerance for a single batch run.

use chrono::{DateTime, TimeDelta, Utc};
use std::time::Duration;

/// Policy applied by the orchestrator to one run
#[derive(Debug, Clone, PartialEq)]
pub struct RunPolicy {
    /// Absolute instant after which every outstanding job is terminated
    pub deadline: DateTime<Utc>,

    /// Pause between two monitoring cycles
    pub poll_interval: Duration,

    /// Minimum fraction of observed jobs that must succeed, in [0, 1]
    pub success_rate: f64,

    /// Cap on the number of descriptors actually submitted
    pub max_runs: Option<usize>,
}

impl RunPolicy {
    /// Creates a policy whose deadline is `timeout` from now
    pub fn new(timeout: Duration, poll_interval: Duration, success_rate: f64) -> Self {
        Self::with_deadline(deadline_after(Utc::now(), timeout), poll_interval, success_rate)
    }

    /// Creates a policy with an explicit deadline
    pub fn with_deadline(
        deadline: DateTime<Utc>,
        poll_interval: Duration,
        success_rate: f64,
    ) -> Self {
        Self {
            deadline,
            poll_interval,
            success_rate,
            max_runs: None,
        }
    }

    pub fn with_max_runs(mut self, max_runs: Option<usize>) -> Self {
        self.max_runs = max_runs;
        self
    }

    /// Highest tolerated failure rate
    pub fn failure_threshold(&self) -> f64 {
        1.0 - self.success_rate
    }

    /// Whether the deadline has been reached at `now`
    pub fn deadline_exceeded_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.deadline
    }

    /// Time left before the deadline (negative once it has passed)
    pub fn remaining_at(&self, now: DateTime<Utc>) -> TimeDelta {
        self.deadline - now
    }
}

fn deadline_after(start: DateTime<Utc>, timeout: Duration) -> DateTime<Utc> {
    TimeDelta::from_std(timeout)
        .ok()
        .and_then(|delta| start.checked_add_signed(delta))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}
