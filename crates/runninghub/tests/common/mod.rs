#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use mediagen_core::artifact::OutputArtifact;
use mediagen_core::polling::{PollConfig, RetryPolicy};
use mediagen_core::request::{FileRef, JobRequest, NodeParameter};
use mediagen_core::types::JobId;
use mediagen_runninghub::{AsyncJobClient, RunningHubConfig, RunningHubError, StatusReport, VendorApi};

type Scripted<T> = Mutex<VecDeque<Result<T, RunningHubError>>>;

/// In-memory vendor answering from per-endpoint scripts.
///
/// When a script runs dry the vendor falls back to a neutral answer:
/// `run` assigns `job-default`, `status` reports `RUNNING` and `outputs`
/// returns an empty list.
#[derive(Default)]
pub struct ScriptedVendor {
    runs: Scripted<JobId>,
    statuses: Scripted<StatusReport>,
    outputs: Scripted<Vec<OutputArtifact>>,
    pub upload_calls: AtomicU32,
    pub run_calls: AtomicU32,
    pub status_calls: AtomicU32,
    pub output_calls: AtomicU32,
}

impl ScriptedVendor {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push_run(&self, answer: Result<&str, RunningHubError>) {
        self.runs
            .lock()
            .unwrap()
            .push_back(answer.map(str::to_string));
    }

    pub fn push_status(&self, token: &str) {
        self.statuses
            .lock()
            .unwrap()
            .push_back(Ok(StatusReport::new(token)));
    }

    pub fn push_status_report(&self, report: StatusReport) {
        self.statuses.lock().unwrap().push_back(Ok(report));
    }

    pub fn push_status_error(&self, error: RunningHubError) {
        self.statuses.lock().unwrap().push_back(Err(error));
    }

    pub fn push_outputs(&self, outputs: Vec<OutputArtifact>) {
        self.outputs.lock().unwrap().push_back(Ok(outputs));
    }

    pub fn push_outputs_error(&self, error: RunningHubError) {
        self.outputs.lock().unwrap().push_back(Err(error));
    }

    pub fn status_calls(&self) -> u32 {
        self.status_calls.load(Ordering::SeqCst)
    }

    pub fn run_calls(&self) -> u32 {
        self.run_calls.load(Ordering::SeqCst)
    }

    pub fn output_calls(&self) -> u32 {
        self.output_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VendorApi for ScriptedVendor {
    async fn upload(
        &self,
        file_name: &str,
        _bytes: Vec<u8>,
        _content_type: Option<&str>,
    ) -> Result<FileRef, RunningHubError> {
        self.upload_calls.fetch_add(1, Ordering::SeqCst);
        Ok(FileRef::from_upload(format!("api/{file_name}"))?)
    }

    async fn run(&self, _request: &JobRequest) -> Result<JobId, RunningHubError> {
        self.run_calls.fetch_add(1, Ordering::SeqCst);
        self.runs
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok("job-default".to_string()))
    }

    async fn status(&self, _job_id: &str) -> Result<StatusReport, RunningHubError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        self.statuses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(StatusReport::new("RUNNING")))
    }

    async fn outputs(&self, _job_id: &str) -> Result<Vec<OutputArtifact>, RunningHubError> {
        self.output_calls.fetch_add(1, Ordering::SeqCst);
        self.outputs
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

pub fn test_config() -> RunningHubConfig {
    RunningHubConfig::new("http://vendor.test", "test-key")
}

/// Client over `vendor` with the default retry policies.
pub fn client(vendor: &Arc<ScriptedVendor>) -> AsyncJobClient {
    AsyncJobClient::with_api(vendor.clone(), &test_config())
}

/// Client over `vendor` with custom transport retry.
pub fn client_with_transport_retry(
    vendor: &Arc<ScriptedVendor>,
    retry: RetryPolicy,
) -> AsyncJobClient {
    let mut config = test_config();
    config.transport_retry = retry;
    AsyncJobClient::with_api(vendor.clone(), &config)
}

pub fn poll_config(interval_secs: u64, max_attempts: u32) -> PollConfig {
    PollConfig::new(
        Duration::from_secs(interval_secs),
        max_attempts,
        Duration::from_secs(interval_secs * u64::from(max_attempts)),
    )
}

pub fn video_request() -> JobRequest {
    JobRequest::new("wf-video")
        .with_parameter(NodeParameter::text("6", "text", "a cat dancing"))
        .with_parameter(NodeParameter::file(
            "52",
            "image",
            FileRef::from_upload("api/cat.png").unwrap(),
        ))
}

pub fn artifact(url: &str, hint: Option<&str>) -> OutputArtifact {
    OutputArtifact::new(url, hint.map(str::to_string))
}

pub fn bad_gateway() -> RunningHubError {
    RunningHubError::HttpStatus {
        status: 502,
        body: "bad gateway".to_string(),
    }
}

pub fn queue_full() -> RunningHubError {
    RunningHubError::QueueSaturated {
        code: 421,
        message: "TASK_QUEUE_MAXED".to_string(),
    }
}

pub fn rejected(message: &str) -> RunningHubError {
    RunningHubError::VendorRejected {
        code: 1001,
        message: message.to_string(),
    }
}
