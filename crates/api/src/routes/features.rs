use axum::routing::get;
use axum::Router;

use crate::handlers::features;
use crate::state::AppState;

/// Routes mounted at `/features`.
///
/// ```text
/// GET    /                -> list_features
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(features::list_features))
}
