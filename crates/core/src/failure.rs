//! Machine-checkable failure taxonomy for generation jobs.
//!
//! Every failure that reaches the UI layer carries one [`JobErrorKind`]
//! plus a human-readable message. The kind decides how a caller reacts:
//! retry automatically, offer a manual retry, or just report.

use serde::{Deserialize, Serialize};

/// Classification of everything that can go wrong between submission and
/// a resolved artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobErrorKind {
    /// HTTP or network failure reaching the vendor.
    Transport,
    /// The vendor answered with a non-success code.
    VendorRejected,
    /// The vendor's processing queue is temporarily full.
    QueueSaturated,
    /// The vendor reported terminal failure for an accepted job.
    JobFailed,
    /// The client-side poll budget ran out without a terminal status.
    JobTimedOut,
    /// The job reported success but produced no usable output.
    MalformedResult,
    /// The request was rejected locally before reaching the vendor.
    InvalidRequest,
}

impl JobErrorKind {
    /// Stable wire code, identical to the serde representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Transport => "TRANSPORT",
            Self::VendorRejected => "VENDOR_REJECTED",
            Self::QueueSaturated => "QUEUE_SATURATED",
            Self::JobFailed => "JOB_FAILED",
            Self::JobTimedOut => "JOB_TIMED_OUT",
            Self::MalformedResult => "MALFORMED_RESULT",
            Self::InvalidRequest => "INVALID_REQUEST",
        }
    }

    /// Whether the caller should retry the same request automatically.
    pub fn is_auto_retryable(self) -> bool {
        matches!(self, Self::QueueSaturated | Self::Transport)
    }

    /// Whether the UI should offer a manual retry with the same request.
    ///
    /// A timed-out job may still finish on the vendor side, so resubmitting
    /// is the only way forward for the user.
    pub fn suggests_manual_retry(self) -> bool {
        matches!(
            self,
            Self::JobTimedOut | Self::QueueSaturated | Self::Transport
        )
    }

    /// Default user-facing line for this kind.
    pub fn user_message(self) -> &'static str {
        match self {
            Self::Transport => "Could not reach the generation service. Please try again.",
            Self::VendorRejected => "The generation service rejected the request.",
            Self::QueueSaturated => "The server is busy right now. Please try again in a moment.",
            Self::JobFailed => "Generation failed.",
            Self::JobTimedOut => {
                "Generation is taking longer than expected. You can retry with the same input."
            }
            Self::MalformedResult => "Generation finished but produced no output.",
            Self::InvalidRequest => "The request is invalid.",
        }
    }
}

impl std::fmt::Display for JobErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
