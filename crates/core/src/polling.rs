//! Poll budgets and retry policies.
//!
//! The vendor does not push completion, so every job is driven by a fixed
//! interval poll with a bounded number of attempts. Callers must size the
//! budget to the expected generation time of the workflow.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Bounds
// ---------------------------------------------------------------------------

/// Shortest allowed interval between status calls.
pub const MIN_POLL_INTERVAL_MS: u64 = 10;
/// Hard ceiling on polls per job.
pub const MAX_POLL_ATTEMPTS: u32 = 10_000;

/// Delay before resubmitting a queue-saturated request.
pub const QUEUE_RETRY_DELAY: Duration = Duration::from_secs(5);
/// Total submissions tried while the vendor queue is full.
pub const QUEUE_RETRY_ATTEMPTS: u32 = 3;

/// Delay before reissuing a status call that failed at the transport level.
pub const TRANSPORT_RETRY_DELAY: Duration = Duration::from_secs(10);
/// Consecutive failed status calls tolerated (first try plus three retries).
pub const TRANSPORT_RETRY_ATTEMPTS: u32 = 4;

// ---------------------------------------------------------------------------
// PollConfig
// ---------------------------------------------------------------------------

/// How often and how long to poll one job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollConfig {
    /// Fixed delay between status calls. Not a backoff.
    #[serde(with = "duration_ms")]
    pub interval: Duration,
    /// Polls issued before the job is forced to `TimedOut`.
    pub max_attempts: u32,
    /// Typical generation time, used only by the progress heuristic.
    #[serde(with = "duration_ms")]
    pub expected_duration: Duration,
}

impl PollConfig {
    pub fn new(interval: Duration, max_attempts: u32, expected_duration: Duration) -> Self {
        Self {
            interval,
            max_attempts,
            expected_duration,
        }
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.interval < Duration::from_millis(MIN_POLL_INTERVAL_MS) {
            return Err(CoreError::Validation(format!(
                "Poll interval must be at least {MIN_POLL_INTERVAL_MS} ms"
            )));
        }
        if self.max_attempts == 0 || self.max_attempts > MAX_POLL_ATTEMPTS {
            return Err(CoreError::Validation(format!(
                "max_attempts must be between 1 and {MAX_POLL_ATTEMPTS}, got {}",
                self.max_attempts
            )));
        }
        if self.expected_duration.is_zero() {
            return Err(CoreError::Validation(
                "expected_duration must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Wall-clock budget implied by the interval and attempt bound.
    pub fn budget(&self) -> Duration {
        self.interval.saturating_mul(self.max_attempts)
    }
}

// ---------------------------------------------------------------------------
// RetryPolicy
// ---------------------------------------------------------------------------

/// Fixed-delay retry bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total tries, including the first one.
    pub max_attempts: u32,
    #[serde(with = "duration_ms")]
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }

    /// Policy for queue-saturated submissions (3 tries, 5 s apart).
    pub fn queue_saturation() -> Self {
        Self::new(QUEUE_RETRY_ATTEMPTS, QUEUE_RETRY_DELAY)
    }

    /// Policy for transport failures while polling (4 tries, 10 s apart).
    pub fn poll_transport() -> Self {
        Self::new(TRANSPORT_RETRY_ATTEMPTS, TRANSPORT_RETRY_DELAY)
    }

    /// Whether another try is allowed after `failures` failed ones.
    pub fn allows_another(&self, failures: u32) -> bool {
        failures < self.max_attempts
    }
}

mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
