use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use mediagen_core::error::CoreError;
use mediagen_core::failure::JobErrorKind;
use mediagen_runninghub::RunningHubError;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors and [`RunningHubError`] for vendor
/// errors, and adds HTTP-specific variants. Implements [`IntoResponse`] to
/// produce consistent JSON error responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `mediagen_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A classified vendor error from `mediagen_runninghub`.
    #[error(transparent)]
    Vendor(#[from] RunningHubError),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// An internal error with a human-readable message.
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Core(core) => classify_core_error(core),
            AppError::Vendor(err) => classify_vendor_error(err),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

fn classify_core_error(core: &CoreError) -> (StatusCode, &'static str, String) {
    match core {
        CoreError::NotFound { entity, id } => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            format!("{entity} with id {id} not found"),
        ),
        CoreError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
        CoreError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
    }
}

/// Map a vendor error to an HTTP status, error code, and message.
///
/// - Local validation failures map to 400.
/// - Queue saturation maps to 503 so the page can offer a retry.
/// - Vendor rejections map to 502 with the vendor's message.
/// - Transport failures map to 502 with a sanitized message.
fn classify_vendor_error(err: &RunningHubError) -> (StatusCode, &'static str, String) {
    match err {
        RunningHubError::InvalidRequest(core) => classify_core_error(core),
        RunningHubError::QueueSaturated { .. } => (
            StatusCode::SERVICE_UNAVAILABLE,
            "SERVER_BUSY",
            JobErrorKind::QueueSaturated.user_message().to_string(),
        ),
        RunningHubError::VendorRejected { message, .. } => {
            tracing::warn!(error = %err, "Vendor rejected request");
            (
                StatusCode::BAD_GATEWAY,
                "VENDOR_REJECTED",
                format!("{} {message}", JobErrorKind::VendorRejected.user_message()),
            )
        }
        RunningHubError::Request(_)
        | RunningHubError::HttpStatus { .. }
        | RunningHubError::MalformedResponse(_) => {
            tracing::error!(error = %err, "Vendor unavailable");
            (
                StatusCode::BAD_GATEWAY,
                "VENDOR_UNAVAILABLE",
                JobErrorKind::Transport.user_message().to_string(),
            )
        }
    }
}
