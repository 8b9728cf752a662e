use axum::extract::DefaultBodyLimit;
use axum::routing::post;
use axum::Router;

use crate::handlers::uploads;
use crate::state::AppState;

/// Largest accepted upload body.
pub const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// Routes mounted at `/uploads`.
///
/// ```text
/// POST   /                -> upload_file
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(uploads::upload_file))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
}
