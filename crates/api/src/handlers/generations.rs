//! Handler for the `/generations` resource.
//!
//! One route per feature page. The page sends the node bindings of its
//! form; the server resolves the feature's workflow, submits the job with
//! queue retry and hands polling to the [`JobTracker`](crate::tracker::JobTracker).

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use mediagen_core::error::CoreError;
use mediagen_core::feature::GenerationFeature;
use mediagen_core::request::{JobRequest, NodeParameter};

use crate::error::{AppError, AppResult};
use crate::registry::UploadRegistry;
use crate::response::DataResponse;
use crate::state::AppState;
use crate::tracker::JobSnapshot;

/// Request body for `POST /generations/{feature}`.
#[derive(Debug, Deserialize)]
pub struct GenerationInput {
    pub parameters: Vec<ParameterInput>,
}

/// One node binding. Exactly one of `text` and `file_ref` must be set.
#[derive(Debug, Deserialize)]
pub struct ParameterInput {
    pub slot_id: String,
    pub field_name: String,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub file_ref: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl ParameterInput {
    async fn into_parameter(self, uploads: &UploadRegistry) -> Result<NodeParameter, CoreError> {
        let parameter = match (self.text, self.file_ref) {
            (Some(text), None) => NodeParameter::text(self.slot_id, self.field_name, text),
            (None, Some(raw)) => {
                let file_ref = uploads.resolve(&raw).await?;
                NodeParameter::file(self.slot_id, self.field_name, file_ref)
            }
            _ => {
                return Err(CoreError::Validation(format!(
                    "Parameter {}/{} needs exactly one of text or file_ref",
                    self.slot_id, self.field_name
                )))
            }
        };

        Ok(match self.description {
            Some(description) => parameter.with_description(description),
            None => parameter,
        })
    }
}

/// POST /api/v1/generations/{feature}
///
/// Submit a generation job for `feature`. Returns 202 with the initial job
/// snapshot; poll `GET /api/v1/jobs/{id}` for progress.
pub async fn submit_generation(
    State(state): State<AppState>,
    Path(feature): Path<String>,
    Json(input): Json<GenerationInput>,
) -> AppResult<impl IntoResponse> {
    let feature: GenerationFeature = feature.parse()?;
    let workflow = state
        .config
        .workflow_for(feature)
        .ok_or_else(|| CoreError::NotFound {
            entity: "Feature",
            id: feature.to_string(),
        })?;

    let mut request = JobRequest::new(workflow);
    for parameter in input.parameters {
        request = request.with_parameter(parameter.into_parameter(&state.uploads).await?);
    }
    request.validate()?;

    // Detached so a job the vendor accepts is tracked even when this
    // request is dropped mid-submission.
    let snapshot = tokio::spawn(submit_and_track(state, request, feature))
        .await
        .map_err(|e| AppError::InternalError(format!("Submission task failed: {e}")))??;

    Ok((StatusCode::ACCEPTED, Json(DataResponse { data: snapshot })))
}

/// Submit with queue retry and hand the accepted job to the tracker.
async fn submit_and_track(
    state: AppState,
    request: JobRequest,
    feature: GenerationFeature,
) -> AppResult<JobSnapshot> {
    let cancel = state.tracker.child_token();
    let job = state
        .client
        .submit_with_retry(&request, feature.media_category(), &cancel)
        .await?;

    let snapshot = state
        .tracker
        .track(
            state.client.clone(),
            job,
            feature,
            state.config.poll_config_for(feature),
        )
        .await;

    tracing::info!(
        job_id = %snapshot.id,
        %feature,
        parameters = request.parameters.len(),
        "Generation submitted",
    );

    Ok(snapshot)
}
