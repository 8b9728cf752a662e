//! Handler for the `/uploads` resource.

use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

use mediagen_core::request::FileRef;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// Multipart field carrying the file.
const FILE_FIELD: &str = "file";
/// Name used when the client sends none.
const DEFAULT_FILE_NAME: &str = "upload";

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub file_ref: FileRef,
    pub size: usize,
}

/// POST /api/v1/uploads
///
/// Forward the multipart `file` field to the vendor and return the file
/// reference to bind into a generation request. Returns 201.
pub async fn upload_file(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {e}")))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let file_name = field
            .file_name()
            .map(str::to_string)
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_FILE_NAME.to_string());
        let content_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("Failed to read upload: {e}")))?;
        let size = bytes.len();

        let file_ref = state
            .client
            .upload(&file_name, bytes.to_vec(), content_type.as_deref())
            .await?;
        state.uploads.record(file_ref.clone()).await;

        tracing::info!(file_name = %file_name, size, file_ref = %file_ref, "File uploaded");

        return Ok((
            StatusCode::CREATED,
            Json(DataResponse {
                data: UploadResponse { file_ref, size },
            }),
        ));
    }

    Err(AppError::BadRequest(format!(
        "Multipart body has no '{FILE_FIELD}' field"
    )))
}
