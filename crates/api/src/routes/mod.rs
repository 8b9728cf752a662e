pub mod features;
pub mod generations;
pub mod health;
pub mod jobs;
pub mod uploads;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /features                                        list enabled features (GET)
///
/// /uploads                                         upload input file (POST)
///
/// /generations/{feature}                           submit generation (POST)
///
/// /jobs/{id}                                       job snapshot (GET)
/// /jobs/{id}/cancel                                stop polling (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/features", features::router())
        .nest("/uploads", uploads::router())
        .nest("/generations", generations::router())
        .nest("/jobs", jobs::router())
}
