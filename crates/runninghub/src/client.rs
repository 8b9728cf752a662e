//! Submission, polling and result resolution for vendor jobs.
//!
//! [`AsyncJobClient`] drives the vendor's submit-then-poll protocol over any
//! [`VendorApi`]: it submits a [`JobRequest`], polls the job's status at a
//! fixed interval, resolves the output artifact once the vendor reports
//! success, and folds every failure into the job's terminal state.
//!
//! All waiting goes through `tokio::time::sleep` raced against a
//! [`CancellationToken`], so callers can stop a wait at any point.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio_util::sync::CancellationToken;

use mediagen_core::artifact::{select_artifact, MediaCategory};
use mediagen_core::error::CoreError;
use mediagen_core::failure::JobErrorKind;
use mediagen_core::job::{Job, JobState, GENERIC_FAILURE_REASON, NO_OUTPUT_REASON};
use mediagen_core::polling::{PollConfig, RetryPolicy};
use mediagen_core::progress::{ProgressTracker, ProgressUpdate};
use mediagen_core::request::{FileRef, JobRequest};
use mediagen_core::status::{StatusClass, StatusVocabulary};

use crate::api::{RunningHubApi, VendorApi};
use crate::config::RunningHubConfig;
use crate::error::RunningHubError;

/// Message surfaced when the queue stays full through every resubmission.
pub const SERVER_BUSY_MESSAGE: &str = "server busy, please try again later";

/// High-level job client shared by every generation feature.
///
/// Cheap to share behind an `Arc`; every method takes `&self`.
pub struct AsyncJobClient {
    api: Arc<dyn VendorApi>,
    vocabulary: StatusVocabulary,
    queue_retry: RetryPolicy,
    transport_retry: RetryPolicy,
}

impl AsyncJobClient {
    /// Build a client talking HTTP to the configured vendor.
    pub fn new(config: RunningHubConfig) -> Result<Self, RunningHubError> {
        config.validate()?;
        let api = RunningHubApi::new(config.clone())?;
        Ok(Self::with_api(Arc::new(api), &config))
    }

    /// Build a client over any [`VendorApi`] implementation, taking the
    /// vocabulary and retry policies from `config`.
    pub fn with_api(api: Arc<dyn VendorApi>, config: &RunningHubConfig) -> Self {
        Self {
            api,
            vocabulary: config.vocabulary.clone(),
            queue_retry: config.queue_retry,
            transport_retry: config.transport_retry,
        }
    }

    pub fn vocabulary(&self) -> &StatusVocabulary {
        &self.vocabulary
    }

    // -----------------------------------------------------------------------
    // Upload and submission
    // -----------------------------------------------------------------------

    /// Upload an input file and return the reference to bind into a
    /// [`JobRequest`].
    pub async fn upload(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
        content_type: Option<&str>,
    ) -> Result<FileRef, RunningHubError> {
        if file_name.trim().is_empty() {
            return Err(CoreError::Validation("Upload needs a file name".to_string()).into());
        }
        if bytes.is_empty() {
            return Err(CoreError::Validation(format!("Upload '{file_name}' is empty")).into());
        }
        self.api.upload(file_name, bytes, content_type).await
    }

    /// Submit a job once.
    ///
    /// The request is validated locally first; an invalid request never
    /// reaches the vendor.
    pub async fn submit(
        &self,
        request: &JobRequest,
        expected_media: MediaCategory,
    ) -> Result<Job, RunningHubError> {
        request.validate()?;

        let job_id = self.api.run(request).await?;
        tracing::info!(
            job_id = %job_id,
            target_endpoint = %request.target_endpoint,
            parameters = request.parameters.len(),
            "Job submitted",
        );

        Ok(Job::submitted(job_id, expected_media, Utc::now()))
    }

    /// Submit a job, resubmitting while the vendor reports a full queue.
    ///
    /// At most `queue_retry.max_attempts` submissions are made, spaced by
    /// `queue_retry.delay`. When the queue is still full after the last one
    /// the error is surfaced as [`RunningHubError::VendorRejected`] with a
    /// "server busy" message. Any other error is returned immediately.
    ///
    /// If `cancel` fires while waiting between submissions, the last
    /// queue-full error is returned unchanged.
    pub async fn submit_with_retry(
        &self,
        request: &JobRequest,
        expected_media: MediaCategory,
        cancel: &CancellationToken,
    ) -> Result<Job, RunningHubError> {
        let mut tries = 0u32;

        loop {
            tries += 1;
            match self.submit(request, expected_media).await {
                Ok(job) => return Ok(job),
                Err(RunningHubError::QueueSaturated { code, message }) => {
                    if !self.queue_retry.allows_another(tries) {
                        tracing::warn!(
                            target_endpoint = %request.target_endpoint,
                            tries,
                            "Vendor queue still full, giving up",
                        );
                        return Err(RunningHubError::VendorRejected {
                            code,
                            message: format!("{SERVER_BUSY_MESSAGE} ({message})"),
                        });
                    }

                    tracing::warn!(
                        target_endpoint = %request.target_endpoint,
                        attempt = tries,
                        max_attempts = self.queue_retry.max_attempts,
                        delay_ms = self.queue_retry.delay.as_millis() as u64,
                        "Vendor queue full, resubmitting",
                    );

                    tokio::select! {
                        _ = cancel.cancelled() => {
                            return Err(RunningHubError::QueueSaturated { code, message });
                        }
                        _ = tokio::time::sleep(self.queue_retry.delay) => {}
                    }
                }
                Err(e) => return Err(e),
            }
        }
    }

    // -----------------------------------------------------------------------
    // Polling
    // -----------------------------------------------------------------------

    /// Perform one status check and fold the answer into `job`.
    ///
    /// A terminal job is left untouched and no call is made. Otherwise
    /// `attempts` is incremented and the status token is classified:
    ///
    /// - success: outputs are fetched once and the artifact matching the
    ///   job's media category is selected. No usable output fails the job
    ///   with [`JobErrorKind::MalformedResult`].
    /// - failure: the job fails with [`JobErrorKind::JobFailed`].
    /// - anything else: the job is running.
    ///
    /// Transport problems are returned as errors and leave the job
    /// non-terminal so the caller can decide whether to retry.
    pub async fn poll(&self, job: &mut Job) -> Result<JobState, RunningHubError> {
        if job.is_terminal() {
            return Ok(job.state);
        }

        job.record_attempt();
        let report = self.api.status(&job.id).await?;

        match self.vocabulary.classify(&report.token) {
            StatusClass::Running => {
                if !self.vocabulary.is_known(&report.token) {
                    tracing::debug!(
                        job_id = %job.id,
                        token = %report.token,
                        "Unrecognised status token, treating as running",
                    );
                }
                job.mark_running();
            }
            StatusClass::Failed => {
                let reason = report
                    .message
                    .filter(|m| !m.trim().is_empty())
                    .unwrap_or_else(|| GENERIC_FAILURE_REASON.to_string());
                tracing::warn!(job_id = %job.id, reason = %reason, "Job failed on the vendor side");
                job.mark_failed(JobErrorKind::JobFailed, reason);
            }
            StatusClass::Succeeded => {
                let outputs = self.api.outputs(&job.id).await?;
                match select_artifact(&outputs, job.expected_media) {
                    Some(artifact) => {
                        tracing::info!(
                            job_id = %job.id,
                            attempts = job.attempts,
                            url = %artifact.url,
                            "Job succeeded",
                        );
                        job.mark_succeeded(artifact.clone());
                    }
                    None => {
                        tracing::warn!(
                            job_id = %job.id,
                            outputs = outputs.len(),
                            "Job reported success without a usable output",
                        );
                        job.mark_failed(JobErrorKind::MalformedResult, NO_OUTPUT_REASON);
                    }
                }
            }
        }

        Ok(job.state)
    }

    /// Poll `job` until it reaches a terminal state, the poll budget runs
    /// out, or `cancel` fires.
    ///
    /// `on_progress` is called once after every status check with a
    /// monotonic progress estimate. Transient failures are retried in place
    /// up to `transport_retry.max_attempts` consecutive times before the job
    /// is abandoned; other errors fail the job immediately. A cancelled job
    /// is returned in its last observed state.
    ///
    /// Only an invalid `config` is reported as `Err`; every vendor-side
    /// outcome is recorded on the returned job.
    pub async fn await_completion(
        &self,
        mut job: Job,
        config: &PollConfig,
        cancel: &CancellationToken,
        mut on_progress: impl FnMut(ProgressUpdate) + Send,
    ) -> Result<Job, RunningHubError> {
        config.validate()?;

        let mut progress = ProgressTracker::new(*config);
        let mut consecutive_failures = 0u32;

        while !job.is_terminal() {
            if cancel.is_cancelled() {
                tracing::info!(job_id = %job.id, attempts = job.attempts, "Polling cancelled");
                return Ok(job);
            }

            let (retrying, delay) = match self.poll(&mut job).await {
                Ok(_) => {
                    consecutive_failures = 0;
                    (false, config.interval)
                }
                Err(e) => {
                    consecutive_failures += 1;
                    if e.is_transient() && self.transport_retry.allows_another(consecutive_failures)
                    {
                        tracing::warn!(
                            job_id = %job.id,
                            attempt = job.attempts,
                            failures = consecutive_failures,
                            error = %e,
                            "Status check failed, retrying",
                        );
                        (true, self.transport_retry.delay)
                    } else {
                        let reason = if e.is_transient() {
                            format!(
                                "gave up after {consecutive_failures} consecutive failed status checks: {e}"
                            )
                        } else {
                            e.to_string()
                        };
                        tracing::error!(job_id = %job.id, error = %e, "Abandoning job");
                        job.mark_failed(e.kind(), reason);
                        (false, Duration::ZERO)
                    }
                }
            };

            if !job.is_terminal() && job.attempts >= config.max_attempts {
                tracing::warn!(
                    job_id = %job.id,
                    attempts = job.attempts,
                    "Poll budget exhausted",
                );
                job.mark_timed_out();
            }

            on_progress(progress.observe(&job, retrying));

            if job.is_terminal() {
                break;
            }

            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!(job_id = %job.id, attempts = job.attempts, "Polling cancelled");
                    return Ok(job);
                }
                _ = tokio::time::sleep(delay) => {}
            }
        }

        tracing::debug!(
            job_id = %job.id,
            state = job.state.as_str(),
            attempts = job.attempts,
            "Polling finished",
        );
        Ok(job)
    }

    /// Submit with queue retry, then wait for the outcome.
    pub async fn run_to_completion(
        &self,
        request: &JobRequest,
        expected_media: MediaCategory,
        config: &PollConfig,
        cancel: &CancellationToken,
        on_progress: impl FnMut(ProgressUpdate) + Send,
    ) -> Result<Job, RunningHubError> {
        config.validate()?;
        let job = self
            .submit_with_retry(request, expected_media, cancel)
            .await?;
        self.await_completion(job, config, cancel, on_progress).await
    }
}
