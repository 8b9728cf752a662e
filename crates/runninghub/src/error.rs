use mediagen_core::error::CoreError;
use mediagen_core::failure::JobErrorKind;

/// Errors from the RunningHub integration layer.
///
/// Every HTTP call result is classified into one of these before it leaves
/// the crate; [`kind`](Self::kind) gives the machine-checkable taxonomy.
#[derive(Debug, thiserror::Error)]
pub enum RunningHubError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The vendor returned a non-2xx status code.
    #[error("RunningHub returned HTTP {status}: {body}")]
    HttpStatus {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// A 2xx response whose body did not have the expected shape.
    #[error("Malformed RunningHub response: {0}")]
    MalformedResponse(String),

    /// The vendor answered with a non-success code.
    #[error("RunningHub rejected the request (code {code}): {message}")]
    VendorRejected { code: i64, message: String },

    /// The vendor's queue is full; the same request may succeed shortly.
    #[error("RunningHub queue is full (code {code}): {message}")]
    QueueSaturated { code: i64, message: String },

    /// The request failed local validation and was never sent.
    #[error(transparent)]
    InvalidRequest(#[from] CoreError),
}

impl RunningHubError {
    pub fn kind(&self) -> JobErrorKind {
        match self {
            Self::Request(_) | Self::HttpStatus { .. } | Self::MalformedResponse(_) => {
                JobErrorKind::Transport
            }
            Self::VendorRejected { .. } => JobErrorKind::VendorRejected,
            Self::QueueSaturated { .. } => JobErrorKind::QueueSaturated,
            Self::InvalidRequest(_) => JobErrorKind::InvalidRequest,
        }
    }

    /// Whether retrying the same call in place may help.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Request(_) | Self::MalformedResponse(_) => true,
            // Client errors will not fix themselves.
            Self::HttpStatus { status, .. } => *status >= 500 || *status == 408 || *status == 429,
            Self::QueueSaturated { .. } => true,
            Self::VendorRejected { .. } | Self::InvalidRequest(_) => false,
        }
    }
}
