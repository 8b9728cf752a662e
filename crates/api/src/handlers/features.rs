//! Handler for the `/features` resource.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

use mediagen_core::artifact::MediaCategory;
use mediagen_core::feature::GenerationFeature;
use mediagen_core::polling::PollConfig;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/// One enabled generation feature as shown to the pages.
#[derive(Debug, Serialize)]
pub struct FeatureInfo {
    pub feature: GenerationFeature,
    pub media: MediaCategory,
    pub poll: PollConfig,
}

/// GET /api/v1/features
///
/// List the features that have a workflow configured, with the media
/// category they produce and the poll budget their jobs get.
pub async fn list_features(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let features: Vec<FeatureInfo> = state
        .config
        .enabled_features()
        .map(|feature| FeatureInfo {
            feature,
            media: feature.media_category(),
            poll: state.config.poll_config_for(feature),
        })
        .collect();

    Ok(Json(DataResponse { data: features }))
}
