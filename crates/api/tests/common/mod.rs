#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

use mediagen_api::config::ServerConfig;
use mediagen_api::registry::UploadRegistry;
use mediagen_api::router::build_app_router;
use mediagen_api::state::AppState;
use mediagen_api::tracker::JobTracker;
use mediagen_core::artifact::OutputArtifact;
use mediagen_core::feature::GenerationFeature;
use mediagen_core::polling::RetryPolicy;
use mediagen_core::request::{FileRef, JobRequest};
use mediagen_core::types::JobId;
use mediagen_runninghub::{
    AsyncJobClient, RunningHubConfig, RunningHubError, StatusReport, VendorApi,
};

pub const IMAGE_TO_VIDEO_WORKFLOW: &str = "wf-image-to-video";
pub const TEXT_TO_IMAGE_WORKFLOW: &str = "wf-text-to-image";

// ---------------------------------------------------------------------------
// Fake vendor
// ---------------------------------------------------------------------------

/// In-memory vendor shared by every job of a test.
///
/// `run` answers from its script, then assigns `job-<n>`. `status` answers
/// from its script, then repeats the default token. `outputs` always returns
/// the configured list.
pub struct FakeVendor {
    runs: Mutex<VecDeque<Result<JobId, RunningHubError>>>,
    statuses: Mutex<VecDeque<StatusReport>>,
    default_status: Mutex<String>,
    outputs: Mutex<Vec<OutputArtifact>>,
    next_id: AtomicU32,
    run_delay: Mutex<Duration>,
    pub run_calls: AtomicU32,
    pub last_request: Mutex<Option<JobRequest>>,
}

impl FakeVendor {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            runs: Mutex::new(VecDeque::new()),
            statuses: Mutex::new(VecDeque::new()),
            default_status: Mutex::new("RUNNING".to_string()),
            outputs: Mutex::new(Vec::new()),
            next_id: AtomicU32::new(1),
            run_delay: Mutex::new(Duration::ZERO),
            run_calls: AtomicU32::new(0),
            last_request: Mutex::new(None),
        })
    }

    /// Vendor whose jobs run twice, then succeed with one mp4.
    pub fn succeeding() -> Arc<Self> {
        let vendor = Self::new();
        vendor.push_status("RUNNING");
        vendor.push_status("RUNNING");
        vendor.set_default_status("SUCCESS");
        vendor.set_outputs(vec![OutputArtifact::new(
            "https://cdn.test/out.mp4",
            Some("video/mp4".to_string()),
        )]);
        vendor
    }

    pub fn push_run_error(&self, error: RunningHubError) {
        self.runs.lock().unwrap().push_back(Err(error));
    }

    pub fn push_status(&self, token: &str) {
        self.statuses
            .lock()
            .unwrap()
            .push_back(StatusReport::new(token));
    }

    pub fn set_default_status(&self, token: &str) {
        *self.default_status.lock().unwrap() = token.to_string();
    }

    pub fn set_outputs(&self, outputs: Vec<OutputArtifact>) {
        *self.outputs.lock().unwrap() = outputs;
    }

    /// Make every `run` call take `delay` before answering.
    pub fn set_run_delay(&self, delay: Duration) {
        *self.run_delay.lock().unwrap() = delay;
    }

    pub fn run_calls(&self) -> u32 {
        self.run_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VendorApi for FakeVendor {
    async fn upload(
        &self,
        file_name: &str,
        _bytes: Vec<u8>,
        _content_type: Option<&str>,
    ) -> Result<FileRef, RunningHubError> {
        Ok(FileRef::from_upload(format!("api/{file_name}"))?)
    }

    async fn run(&self, request: &JobRequest) -> Result<JobId, RunningHubError> {
        self.run_calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.run_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        *self.last_request.lock().unwrap() = Some(request.clone());
        if let Some(answer) = self.runs.lock().unwrap().pop_front() {
            return answer;
        }
        let n = self.next_id.fetch_add(1, Ordering::SeqCst);
        Ok(format!("job-{n}"))
    }

    async fn status(&self, _job_id: &str) -> Result<StatusReport, RunningHubError> {
        let scripted = self.statuses.lock().unwrap().pop_front();
        let fallback = || StatusReport::new(self.default_status.lock().unwrap().clone());
        Ok(scripted.unwrap_or_else(fallback))
    }

    async fn outputs(&self, _job_id: &str) -> Result<Vec<OutputArtifact>, RunningHubError> {
        Ok(self.outputs.lock().unwrap().clone())
    }
}

// ---------------------------------------------------------------------------
// App builders
// ---------------------------------------------------------------------------

/// Build a test `ServerConfig` with two enabled features and fast polling.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 5,
        workflows: [
            (GenerationFeature::ImageToVideo, IMAGE_TO_VIDEO_WORKFLOW.to_string()),
            (GenerationFeature::TextToImage, TEXT_TO_IMAGE_WORKFLOW.to_string()),
        ]
        .into_iter()
        .collect(),
        poll_interval_ms: Some(10),
        poll_max_attempts: Some(50),
    }
}

/// Vendor config with the default timeouts and retry policies.
pub fn vendor_config() -> RunningHubConfig {
    RunningHubConfig::new("http://vendor.test", "test-key")
}

/// Build an `AppState` over `vendor` with millisecond retry delays.
pub fn build_test_state(vendor: Arc<FakeVendor>) -> AppState {
    let mut vendor_config = vendor_config();
    vendor_config.queue_retry = RetryPolicy::new(3, Duration::from_millis(10));
    vendor_config.transport_retry = RetryPolicy::new(2, Duration::from_millis(10));

    build_state(vendor, test_config(), &vendor_config)
}

/// Build an `AppState` over `vendor` with explicit configs.
pub fn build_state(
    vendor: Arc<FakeVendor>,
    config: ServerConfig,
    vendor_config: &RunningHubConfig,
) -> AppState {
    AppState {
        config: Arc::new(config),
        client: Arc::new(AsyncJobClient::with_api(vendor, vendor_config)),
        tracker: Arc::new(JobTracker::new(Duration::from_secs(5))),
        uploads: Arc::new(UploadRegistry::new()),
    }
}

/// Build the full application router with all middleware layers.
///
/// Uses the same builder as `main.rs` so integration tests exercise the
/// production middleware stack (CORS, request ID, timeout, tracing, panic
/// recovery).
pub fn build_test_app(state: AppState) -> Router {
    let config = Arc::clone(&state.config);
    build_app_router(state, &config).unwrap()
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    app.oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    app.oneshot(
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
    .unwrap()
}

pub async fn post_empty(app: Router, uri: &str) -> Response<Body> {
    app.oneshot(
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    )
    .await
    .unwrap()
}

/// POST a multipart body with one field.
pub async fn post_multipart(
    app: Router,
    uri: &str,
    field: &str,
    file_name: &str,
    bytes: &[u8],
) -> Response<Body> {
    let boundary = "mediagen-test-boundary";
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\nContent-Type: image/png\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

    app.oneshot(
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(
                "content-type",
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .unwrap(),
    )
    .await
    .unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Poll `GET /api/v1/jobs/{id}` until `done` accepts the snapshot.
pub async fn wait_for_job(
    app: &Router,
    job_id: &str,
    done: impl Fn(&serde_json::Value) -> bool,
) -> serde_json::Value {
    for _ in 0..300 {
        let response = get(app.clone(), &format!("/api/v1/jobs/{job_id}")).await;
        let json = body_json(response).await;
        if done(&json["data"]) {
            return json["data"].clone();
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("job {job_id} did not reach the expected state in time");
}
