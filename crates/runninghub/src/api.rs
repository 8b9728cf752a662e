//! REST API client for the RunningHub HTTP endpoints.
//!
//! [`VendorApi`] is the seam between the polling protocol and the wire:
//! [`RunningHubApi`] implements it with [`reqwest`], tests implement it
//! with scripted responses.

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use mediagen_core::artifact::OutputArtifact;
use mediagen_core::error::CoreError;
use mediagen_core::request::{FileRef, JobRequest};
use mediagen_core::types::JobId;

use crate::config::RunningHubConfig;
use crate::error::RunningHubError;
use crate::wire::{Envelope, JobLookup, OutputFile, RunData, RunRequest, UploadData};

/// Raw answer of the status endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusReport {
    /// Vendor status token, unclassified.
    pub token: String,
    /// Vendor message, if any.
    pub message: Option<String>,
}

impl StatusReport {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            message: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// The vendor's four-call protocol.
///
/// Implementations must classify every failure into a
/// [`RunningHubError`]; nothing else escapes.
#[async_trait]
pub trait VendorApi: Send + Sync {
    /// Upload a binary file and return the vendor's reference to it.
    async fn upload(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
        content_type: Option<&str>,
    ) -> Result<FileRef, RunningHubError>;

    /// Submit a job and return the vendor-assigned id.
    async fn run(&self, request: &JobRequest) -> Result<JobId, RunningHubError>;

    /// Fetch the coarse status token of a job.
    async fn status(&self, job_id: &str) -> Result<StatusReport, RunningHubError>;

    /// List the files produced by a finished job.
    async fn outputs(&self, job_id: &str) -> Result<Vec<OutputArtifact>, RunningHubError>;
}

/// HTTP client for one RunningHub account.
pub struct RunningHubApi {
    client: reqwest::Client,
    config: RunningHubConfig,
}

impl RunningHubApi {
    /// Create a new API client with its own connection pool.
    pub fn new(config: RunningHubConfig) -> Result<Self, RunningHubError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self { client, config })
    }

    /// Create an API client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, config: RunningHubConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &RunningHubConfig {
        &self.config
    }

    // ---- private helpers ----

    async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<Envelope<T>, RunningHubError>
    where
        B: serde::Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let response = self
            .client
            .post(self.config.endpoint(path))
            .json(body)
            .send()
            .await?;

        Self::parse_envelope(response).await
    }

    /// Ensure the response has a success status code. Returns the
    /// response unchanged on success, or a [`RunningHubError::HttpStatus`]
    /// containing the status and body text on failure.
    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, RunningHubError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(RunningHubError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Parse a successful response body into the vendor envelope.
    async fn parse_envelope<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<Envelope<T>, RunningHubError> {
        let response = Self::ensure_success(response).await?;
        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| {
            RunningHubError::MalformedResponse(format!("{e} in body: {}", truncate(&text, 200)))
        })
    }

    /// Turn a non-success envelope into the matching error.
    fn reject<T>(&self, envelope: &Envelope<T>) -> RunningHubError {
        let message = envelope
            .message_text()
            .unwrap_or("no message from vendor")
            .to_string();
        if self
            .config
            .is_queue_full(envelope.code, envelope.message_text())
        {
            RunningHubError::QueueSaturated {
                code: envelope.code,
                message,
            }
        } else {
            RunningHubError::VendorRejected {
                code: envelope.code,
                message,
            }
        }
    }

    /// Unwrap the `data` of a successful envelope.
    fn into_data<T>(&self, envelope: Envelope<T>, call: &str) -> Result<T, RunningHubError> {
        if !envelope.is_success() {
            return Err(self.reject(&envelope));
        }
        envelope
            .data
            .ok_or_else(|| RunningHubError::MalformedResponse(format!("{call} response has no data")))
    }
}

#[async_trait]
impl VendorApi for RunningHubApi {
    async fn upload(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
        content_type: Option<&str>,
    ) -> Result<FileRef, RunningHubError> {
        let size = bytes.len();
        let mut part = reqwest::multipart::Part::bytes(bytes).file_name(file_name.to_string());
        if let Some(mime) = content_type {
            part = part.mime_str(mime).map_err(|_| {
                CoreError::Validation(format!("Invalid content type '{mime}' for '{file_name}'"))
            })?;
        }
        let form = reqwest::multipart::Form::new()
            .text("apiKey", self.config.api_key.clone())
            .part("file", part);

        let response = self
            .client
            .post(self.config.endpoint("upload"))
            .multipart(form)
            .send()
            .await?;

        let envelope: Envelope<UploadData> = Self::parse_envelope(response).await?;
        let reference = self.into_data(envelope, "upload")?.into_reference();

        tracing::debug!(file_name, size, reference = %reference, "File uploaded to RunningHub");
        Ok(FileRef::from_upload(reference)?)
    }

    async fn run(&self, request: &JobRequest) -> Result<JobId, RunningHubError> {
        let body = RunRequest::from_request(request, &self.config.api_key);
        let envelope: Envelope<RunData> = self.post_json("run", &body).await?;
        let data = self.into_data(envelope, "run")?;

        if data.job_id.trim().is_empty() {
            return Err(RunningHubError::MalformedResponse(
                "run response has an empty jobId".to_string(),
            ));
        }
        Ok(data.job_id)
    }

    async fn status(&self, job_id: &str) -> Result<StatusReport, RunningHubError> {
        let body = JobLookup {
            api_key: &self.config.api_key,
            job_id,
        };
        let envelope: Envelope<String> = self.post_json("status", &body).await?;
        let message = envelope.message_text().map(str::to_string);
        let token = self.into_data(envelope, "status")?;

        Ok(StatusReport { token, message })
    }

    async fn outputs(&self, job_id: &str) -> Result<Vec<OutputArtifact>, RunningHubError> {
        let body = JobLookup {
            api_key: &self.config.api_key,
            job_id,
        };
        let envelope: Envelope<Vec<OutputFile>> = self.post_json("outputs", &body).await?;
        if !envelope.is_success() {
            return Err(self.reject(&envelope));
        }

        // A null list is reported to the caller as "no outputs".
        Ok(envelope
            .data
            .unwrap_or_default()
            .into_iter()
            .filter_map(OutputFile::into_artifact)
            .collect())
    }
}

fn truncate(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
