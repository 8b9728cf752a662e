//! Cosmetic progress estimate for polled jobs.
//!
//! The vendor reports no progress, so the percentage is a piecewise
//! function of elapsed polling time over the expected duration. It climbs
//! quickly at first, slows down, and never passes [`PENDING_CEILING`]
//! until the job has actually succeeded.

use serde::Serialize;

use crate::job::{Job, JobState};
use crate::polling::PollConfig;
use crate::types::JobId;

/// Highest percentage shown before the vendor confirms success.
pub const PENDING_CEILING: u8 = 95;
/// Percentage shown once the job has succeeded.
pub const COMPLETE_PERCENT: u8 = 100;

/// Fraction of the expected duration covered by the fast first segment.
const FAST_SEGMENT_END: f64 = 0.3;
/// Fraction of the expected duration covered by the middle segment.
const STEADY_SEGMENT_END: f64 = 0.8;
const FAST_SEGMENT_PERCENT: f64 = 30.0;
const STEADY_SEGMENT_PERCENT: f64 = 80.0;
/// Percent gained per expected-duration past the steady segment.
const TAIL_SLOPE: f64 = 25.0;

// ---------------------------------------------------------------------------
// Estimator
// ---------------------------------------------------------------------------

/// Raw heuristic: percent for a given elapsed fraction of the expected
/// duration. Non-decreasing in `fraction`, capped at [`PENDING_CEILING`].
pub fn estimate_percent(fraction: f64) -> u8 {
    let fraction = if fraction.is_finite() { fraction.max(0.0) } else { 0.0 };
    let percent = if fraction <= FAST_SEGMENT_END {
        fraction / FAST_SEGMENT_END * FAST_SEGMENT_PERCENT
    } else if fraction <= STEADY_SEGMENT_END {
        FAST_SEGMENT_PERCENT
            + (fraction - FAST_SEGMENT_END) / (STEADY_SEGMENT_END - FAST_SEGMENT_END)
                * (STEADY_SEGMENT_PERCENT - FAST_SEGMENT_PERCENT)
    } else {
        STEADY_SEGMENT_PERCENT + (fraction - STEADY_SEGMENT_END) * TAIL_SLOPE
    };
    percent.min(f64::from(PENDING_CEILING)).floor() as u8
}

/// Elapsed fraction of the expected duration after `attempts` polls.
pub fn elapsed_fraction(attempts: u32, config: &PollConfig) -> f64 {
    let expected = config.expected_duration.as_secs_f64();
    if expected <= 0.0 {
        return 0.0;
    }
    config.interval.as_secs_f64() * f64::from(attempts) / expected
}

// ---------------------------------------------------------------------------
// Tracker
// ---------------------------------------------------------------------------

/// One progress notification delivered after a poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressUpdate {
    pub job_id: JobId,
    pub state: JobState,
    pub percent: u8,
    pub attempts: u32,
    /// A transport retry is pending for this job.
    pub retrying: bool,
}

/// Per-job monotonic wrapper around [`estimate_percent`].
#[derive(Debug, Clone)]
pub struct ProgressTracker {
    config: PollConfig,
    last_percent: u8,
}

impl ProgressTracker {
    pub fn new(config: PollConfig) -> Self {
        Self {
            config,
            last_percent: 0,
        }
    }

    pub fn last_percent(&self) -> u8 {
        self.last_percent
    }

    /// Produce the next update for `job`. Never lower than the previous one,
    /// and 100 only when the job has succeeded.
    pub fn observe(&mut self, job: &Job, retrying: bool) -> ProgressUpdate {
        let percent = if job.state == JobState::Succeeded {
            COMPLETE_PERCENT
        } else {
            estimate_percent(elapsed_fraction(job.attempts, &self.config))
        };
        self.last_percent = self.last_percent.max(percent);

        ProgressUpdate {
            job_id: job.id.clone(),
            state: job.state,
            percent: self.last_percent,
            attempts: job.attempts,
            retrying,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::artifact::{MediaCategory, OutputArtifact};

    fn config() -> PollConfig {
        PollConfig::new(Duration::from_secs(5), 360, Duration::from_secs(300))
    }

    #[test]
    fn piecewise_breakpoints() {
        assert_eq!(estimate_percent(0.0), 0);
        assert_eq!(estimate_percent(0.3), 30);
        assert_eq!(estimate_percent(0.8), 80);
        assert_eq!(estimate_percent(10.0), PENDING_CEILING);
    }

    #[test]
    fn estimate_is_non_decreasing() {
        let mut previous = 0;
        for step in 0..500 {
            let p = estimate_percent(step as f64 * 0.01);
            assert!(p >= previous, "dropped at step {step}");
            previous = p;
        }
    }

    #[test]
    fn garbage_fraction_is_zero() {
        assert_eq!(estimate_percent(f64::NAN), 0);
        assert_eq!(estimate_percent(-1.0), 0);
    }

    #[test]
    fn tracker_never_reports_complete_before_success() {
        let mut job = Job::submitted("j", MediaCategory::Video, chrono::Utc::now());
        let mut tracker = ProgressTracker::new(config());
        for _ in 0..360 {
            job.record_attempt();
            job.mark_running();
            let update = tracker.observe(&job, false);
            assert!(update.percent <= PENDING_CEILING);
        }
        job.mark_succeeded(OutputArtifact::new("u", None));
        assert_eq!(tracker.observe(&job, false).percent, COMPLETE_PERCENT);
    }

    #[test]
    fn tracker_does_not_go_backwards_after_failure() {
        let mut job = Job::submitted("j", MediaCategory::Image, chrono::Utc::now());
        let mut tracker = ProgressTracker::new(config());
        job.attempts = 40;
        let before = tracker.observe(&job, false).percent;
        job.attempts = 10;
        let after = tracker.observe(&job, true);
        assert!(after.percent >= before);
        assert!(after.retrying);
    }
}
