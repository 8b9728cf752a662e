use axum::routing::post;
use axum::Router;

use crate::handlers::generations;
use crate::state::AppState;

/// Routes mounted at `/generations`.
///
/// ```text
/// POST   /{feature}       -> submit_generation
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/{feature}", post(generations::submit_generation))
}
