//! The job state machine.
//!
//! ```text
//! Submitted ──poll──▶ Running ──poll──▶ Succeeded
//!     │                  │      └─────▶ Failed
//!     │                  └──budget────▶ TimedOut
//!     └────────(any of the above)
//! ```
//!
//! Terminal states are sticky: once a job is `Succeeded`, `Failed` or
//! `TimedOut`, every transition method is a no-op.

use serde::{Deserialize, Serialize};

use crate::artifact::{MediaCategory, OutputArtifact};
use crate::failure::JobErrorKind;
use crate::types::{JobId, Timestamp};

/// Reason recorded when the vendor reports success but lists no output.
pub const NO_OUTPUT_REASON: &str = "no output produced despite success status";

/// Reason recorded when the vendor reports failure without a message.
pub const GENERIC_FAILURE_REASON: &str = "generation failed on the vendor side";

/// Reason recorded when the client-side poll budget runs out.
pub const TIMED_OUT_REASON: &str =
    "job did not finish within the polling budget; it may still complete on the vendor side";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Submitted,
    Running,
    Succeeded,
    Failed,
    TimedOut,
}

impl JobState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::TimedOut)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Submitted => "submitted",
            Self::Running => "running",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
            Self::TimedOut => "timed_out",
        }
    }
}

/// One vendor-side unit of generation work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    /// Vendor-assigned identifier. Never changes after submission.
    pub id: JobId,
    pub state: JobState,
    pub created_at: Timestamp,
    /// Status calls issued so far.
    pub attempts: u32,
    /// Category used to pick the artifact once the job succeeds.
    pub expected_media: MediaCategory,
    /// Present only in `Succeeded`.
    pub result: Option<OutputArtifact>,
    /// Present only in `Failed` / `TimedOut`.
    pub failure_reason: Option<String>,
    /// Present only in `Failed` / `TimedOut`.
    pub failure_kind: Option<JobErrorKind>,
}

impl Job {
    /// A freshly accepted job.
    pub fn submitted(id: impl Into<JobId>, expected_media: MediaCategory, now: Timestamp) -> Self {
        Self {
            id: id.into(),
            state: JobState::Submitted,
            created_at: now,
            attempts: 0,
            expected_media,
            result: None,
            failure_reason: None,
            failure_kind: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// Count one issued status call.
    pub fn record_attempt(&mut self) {
        self.attempts = self.attempts.saturating_add(1);
    }

    pub fn mark_running(&mut self) {
        if !self.is_terminal() {
            self.state = JobState::Running;
        }
    }

    pub fn mark_succeeded(&mut self, artifact: OutputArtifact) {
        if !self.is_terminal() {
            self.state = JobState::Succeeded;
            self.result = Some(artifact);
        }
    }

    pub fn mark_failed(&mut self, kind: JobErrorKind, reason: impl Into<String>) {
        if !self.is_terminal() {
            self.state = JobState::Failed;
            self.failure_kind = Some(kind);
            self.failure_reason = Some(reason.into());
        }
    }

    pub fn mark_timed_out(&mut self) {
        if !self.is_terminal() {
            self.state = JobState::TimedOut;
            self.failure_kind = Some(JobErrorKind::JobTimedOut);
            self.failure_reason = Some(TIMED_OUT_REASON.to_string());
        }
    }

    /// URL of the resolved artifact, if the job succeeded.
    pub fn result_url(&self) -> Option<&str> {
        self.result.as_ref().map(|a| a.url.as_str())
    }
}
