//! Failure-rate breaker
//!
//! The denominator counts RUNNING jobs alongside terminal ones, so a batch
//! with a few early failures and many live jobs does not trip prematurely.

use autobatch_core::domain::job::JobStatus;

/// Per-cycle count of observed statuses
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StatusTally {
    pub succeeded: usize,
    pub failed: usize,
    pub running: usize,
}

impl StatusTally {
    /// Counts a status if it takes part in the breaker
    ///
    /// Returns false for statuses that are ignored this cycle.
    pub fn record(&mut self, status: JobStatus) -> bool {
        match status {
            JobStatus::Succeeded => self.succeeded += 1,
            JobStatus::Failed => self.failed += 1,
            JobStatus::Running => self.running += 1,
            JobStatus::Submitted | JobStatus::Unknown => return false,
        }
        true
    }

    pub fn total(&self) -> usize {
        self.succeeded + self.failed + self.running
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// FAILED / (SUCCEEDED + FAILED + RUNNING)
    pub fn failure_rate(&self) -> f64 {
        if self.is_empty() {
            return 0.0;
        }
        self.failed as f64 / self.total() as f64
    }
}

/// Evaluates the breaker over a tally
///
/// Returns the failure rate when it exceeds `1 - success_rate`.
pub fn evaluate(tally: &StatusTally, success_rate: f64) -> Option<f64> {
    if tally.is_empty() {
        return None;
    }
    let rate = tally.failure_rate();
    if rate > 1.0 - success_rate {
        Some(rate)
    } else {
        None
    }
}

/// Reason string sent to the backend when the breaker trips
pub fn breach_reason(failure_rate: f64) -> String {
    format!(
        "Exiting due to high failure rate: {}%",
        (failure_rate * 100.0) as u32
    )
}
