//! RunningHub JSON wire types.
//!
//! Every vendor response has the envelope shape
//! `{"code": <int>, "data": <payload>, "message": <string>}` where
//! `code == 0` means success. Some endpoints spell the message key `msg`.

use serde::{Deserialize, Serialize};

use mediagen_core::artifact::OutputArtifact;
use mediagen_core::request::JobRequest;

/// Vendor success sentinel.
pub const SUCCESS_CODE: i64 = 0;

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// Body of `POST /run`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunRequest<'a> {
    pub target_endpoint: &'a str,
    pub api_key: &'a str,
    pub parameters: Vec<NodeBinding<'a>>,
}

/// One node binding inside [`RunRequest`].
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeBinding<'a> {
    pub slot_id: &'a str,
    pub field_name: &'a str,
    pub value: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<&'a str>,
}

impl<'a> RunRequest<'a> {
    /// Map a domain request into the vendor's expected shape.
    pub fn from_request(request: &'a JobRequest, api_key: &'a str) -> Self {
        Self {
            target_endpoint: &request.target_endpoint,
            api_key,
            parameters: request
                .parameters
                .iter()
                .map(|p| NodeBinding {
                    slot_id: &p.slot_id,
                    field_name: &p.field_name,
                    value: p.value.as_wire(),
                    description: p.description.as_deref(),
                })
                .collect(),
        }
    }
}

/// Body of `POST /status` and `POST /outputs`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobLookup<'a> {
    pub api_key: &'a str,
    pub job_id: &'a str,
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

/// Common response envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    pub code: i64,
    pub data: Option<T>,
    #[serde(default, alias = "msg")]
    pub message: Option<String>,
}

impl<T> Envelope<T> {
    pub fn is_success(&self) -> bool {
        self.code == SUCCESS_CODE
    }

    /// The vendor message, if it carries any text.
    pub fn message_text(&self) -> Option<&str> {
        self.message.as_deref().map(str::trim).filter(|m| !m.is_empty())
    }
}

/// `data` of a successful `/run` response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunData {
    pub job_id: String,
}

/// `data` of a successful `/upload` response.
///
/// Observed both as a bare string and as `{"fileName": "..."}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum UploadData {
    Reference(String),
    #[serde(rename_all = "camelCase")]
    Object { file_name: String },
}

impl UploadData {
    pub fn into_reference(self) -> String {
        match self {
            Self::Reference(reference) => reference,
            Self::Object { file_name } => file_name,
        }
    }
}

/// One entry of a `/outputs` response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputFile {
    #[serde(default)]
    pub file_url: Option<String>,
    #[serde(default)]
    pub file_type: Option<String>,
}

impl OutputFile {
    /// Convert to a domain artifact, dropping entries without a URL.
    pub fn into_artifact(self) -> Option<OutputArtifact> {
        let url = self.file_url?.trim().to_string();
        if url.is_empty() {
            return None;
        }
        Some(OutputArtifact::new(url, self.file_type))
    }
}
