//! In-memory registry of jobs polled on behalf of browser pages.
//!
//! [`JobTracker`] spawns one polling task per submitted job and keeps the
//! latest [`JobSnapshot`] of each in a [`watch`] channel, so status reads
//! never wait on a poll in progress. Nothing is persisted: a restart forgets
//! every job, which is fine because the vendor keeps the results.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use tokio::sync::{watch, RwLock};
use tokio_util::sync::CancellationToken;

use mediagen_core::error::CoreError;
use mediagen_core::failure::JobErrorKind;
use mediagen_core::feature::GenerationFeature;
use mediagen_core::job::{Job, JobState};
use mediagen_core::polling::PollConfig;
use mediagen_core::progress::{ProgressUpdate, COMPLETE_PERCENT};
use mediagen_core::types::{JobId, Timestamp};
use mediagen_runninghub::AsyncJobClient;

/// Finished jobs are dropped from the tracker after this long.
pub const FINISHED_JOB_RETENTION_SECS: i64 = 3600;

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// What a page sees when it asks about a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobSnapshot {
    pub id: JobId,
    pub feature: GenerationFeature,
    pub state: JobState,
    pub attempts: u32,
    pub percent: u8,
    /// A transport retry is in progress.
    pub retrying: bool,
    /// Local polling was cancelled before the job finished.
    pub cancelled: bool,
    pub result_url: Option<String>,
    pub media_type_hint: Option<String>,
    pub failure_kind: Option<JobErrorKind>,
    /// User-facing line for the failure kind.
    pub message: Option<String>,
    /// Vendor or client detail behind the failure.
    pub detail: Option<String>,
    /// Whether resubmitting the same input is worth offering.
    pub retry_suggested: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl JobSnapshot {
    pub fn new(job: &Job, feature: GenerationFeature) -> Self {
        let mut snapshot = Self {
            id: job.id.clone(),
            feature,
            state: job.state,
            attempts: job.attempts,
            percent: 0,
            retrying: false,
            cancelled: false,
            result_url: None,
            media_type_hint: None,
            failure_kind: None,
            message: None,
            detail: None,
            retry_suggested: false,
            created_at: job.created_at,
            updated_at: job.created_at,
        };
        snapshot.apply_job(job);
        snapshot
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    fn apply_progress(&mut self, update: &ProgressUpdate) {
        self.state = update.state;
        self.attempts = update.attempts;
        self.percent = self.percent.max(update.percent);
        self.retrying = update.retrying;
        self.updated_at = Utc::now();
    }

    fn apply_job(&mut self, job: &Job) {
        self.state = job.state;
        self.attempts = job.attempts;
        self.retrying = false;
        if job.state == JobState::Succeeded {
            self.percent = COMPLETE_PERCENT;
        }
        if let Some(artifact) = &job.result {
            self.result_url = Some(artifact.url.clone());
            self.media_type_hint = artifact.media_type_hint.clone();
        }
        if let Some(kind) = job.failure_kind {
            self.apply_failure(kind, job.failure_reason.clone());
        }
        self.updated_at = Utc::now();
    }

    fn apply_failure(&mut self, kind: JobErrorKind, detail: Option<String>) {
        self.failure_kind = Some(kind);
        self.message = Some(kind.user_message().to_string());
        self.detail = detail;
        self.retry_suggested = kind.suggests_manual_retry();
    }
}

// ---------------------------------------------------------------------------
// Tracker
// ---------------------------------------------------------------------------

/// Owns the polling task of every in-flight job.
///
/// Created once at startup and shared through `AppState`.
pub struct JobTracker {
    jobs: RwLock<HashMap<JobId, TrackedJob>>,
    /// Master cancellation token, cancelled during shutdown.
    cancel: CancellationToken,
    shutdown_timeout: Duration,
}

struct TrackedJob {
    snapshot: Arc<watch::Sender<JobSnapshot>>,
    /// Per-job token (child of the master token).
    cancel: CancellationToken,
    task_handle: tokio::task::JoinHandle<()>,
}

impl JobTracker {
    pub fn new(shutdown_timeout: Duration) -> Self {
        Self {
            jobs: RwLock::new(HashMap::new()),
            cancel: CancellationToken::new(),
            shutdown_timeout,
        }
    }

    /// Token for work that should stop when the tracker shuts down, such
    /// as queue-retry waits during submission.
    pub fn child_token(&self) -> CancellationToken {
        self.cancel.child_token()
    }

    /// Start polling `job` in the background and return its first snapshot.
    pub async fn track(
        &self,
        client: Arc<AsyncJobClient>,
        job: Job,
        feature: GenerationFeature,
        poll: PollConfig,
    ) -> JobSnapshot {
        let snapshot = JobSnapshot::new(&job, feature);
        let (sender, _) = watch::channel(snapshot.clone());
        let sender = Arc::new(sender);
        let cancel = self.cancel.child_token();

        let task_handle = tokio::spawn(poll_job(
            client,
            job,
            poll,
            cancel.clone(),
            Arc::clone(&sender),
        ));

        let mut jobs = self.jobs.write().await;
        prune_finished(&mut jobs);
        jobs.insert(
            snapshot.id.clone(),
            TrackedJob {
                snapshot: sender,
                cancel,
                task_handle,
            },
        );

        tracing::info!(job_id = %snapshot.id, %feature, tracked = jobs.len(), "Tracking job");
        snapshot
    }

    /// Latest snapshot of a tracked job.
    pub async fn snapshot(&self, job_id: &str) -> Result<JobSnapshot, CoreError> {
        let jobs = self.jobs.read().await;
        jobs.get(job_id)
            .map(|tracked| tracked.snapshot.borrow().clone())
            .ok_or_else(|| not_found(job_id))
    }

    /// Stop polling a job. The job keeps its last observed state.
    ///
    /// Cancelling an already finished job is a conflict.
    pub async fn cancel(&self, job_id: &str) -> Result<JobSnapshot, CoreError> {
        let jobs = self.jobs.read().await;
        let tracked = jobs.get(job_id).ok_or_else(|| not_found(job_id))?;

        if tracked.snapshot.borrow().is_terminal() {
            return Err(CoreError::Conflict(format!(
                "Job {job_id} has already finished"
            )));
        }

        tracked.cancel.cancel();
        tracked.snapshot.send_modify(|s| {
            if !s.is_terminal() {
                s.cancelled = true;
                s.retrying = false;
                s.updated_at = Utc::now();
            }
        });

        tracing::info!(job_id, "Job polling cancelled by client");
        let snapshot = tracked.snapshot.borrow().clone();
        Ok(snapshot)
    }

    /// Number of jobs whose polling task is still running.
    pub async fn active_count(&self) -> usize {
        self.jobs
            .read()
            .await
            .values()
            .filter(|tracked| !tracked.task_handle.is_finished())
            .count()
    }

    /// Cancel every polling task and wait for each to exit.
    ///
    /// Waits up to the configured shutdown timeout per task.
    pub async fn shutdown(&self) {
        tracing::info!("Shutting down job tracker");
        self.cancel.cancel();

        let mut jobs = self.jobs.write().await;
        for (job_id, tracked) in jobs.drain() {
            tracked.cancel.cancel();
            if tokio::time::timeout(self.shutdown_timeout, tracked.task_handle)
                .await
                .is_err()
            {
                tracing::warn!(job_id = %job_id, "Polling task did not stop in time");
            }
        }

        tracing::info!("Job tracker shut down complete");
    }
}

// ---- private helpers ----

/// Body of a polling task: wait for the job and publish every update.
async fn poll_job(
    client: Arc<AsyncJobClient>,
    job: Job,
    poll: PollConfig,
    cancel: CancellationToken,
    snapshot: Arc<watch::Sender<JobSnapshot>>,
) {
    let job_id = job.id.clone();
    let result = client
        .await_completion(job, &poll, &cancel, |update| {
            snapshot.send_modify(|s| s.apply_progress(&update));
        })
        .await;

    match result {
        Ok(job) => {
            let cancelled = cancel.is_cancelled() && !job.is_terminal();
            snapshot.send_modify(|s| {
                s.apply_job(&job);
                s.cancelled = cancelled;
            });
            tracing::debug!(
                job_id = %job_id,
                state = job.state.as_str(),
                cancelled,
                "Polling task finished",
            );
        }
        Err(e) => {
            tracing::error!(job_id = %job_id, error = %e, "Polling task could not start");
            snapshot.send_modify(|s| {
                s.apply_failure(e.kind(), Some(e.to_string()));
                s.state = JobState::Failed;
                s.updated_at = Utc::now();
            });
        }
    }
}

/// Drop finished jobs older than [`FINISHED_JOB_RETENTION_SECS`].
fn prune_finished(jobs: &mut HashMap<JobId, TrackedJob>) {
    let now = Utc::now();
    jobs.retain(|_, tracked| {
        let snapshot = tracked.snapshot.borrow();
        let finished = snapshot.is_terminal() || snapshot.cancelled;
        !(finished
            && tracked.task_handle.is_finished()
            && (now - snapshot.updated_at).num_seconds() > FINISHED_JOB_RETENTION_SECS)
    });
}

fn not_found(job_id: &str) -> CoreError {
    CoreError::NotFound {
        entity: "Job",
        id: job_id.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use mediagen_core::artifact::{MediaCategory, OutputArtifact};

    use super::*;

    fn job() -> Job {
        Job::submitted("job-1", MediaCategory::Video, Utc::now())
    }

    #[test]
    fn new_snapshot_is_blank() {
        let snapshot = JobSnapshot::new(&job(), GenerationFeature::ImageToVideo);
        assert_eq!(snapshot.state, JobState::Submitted);
        assert_eq!(snapshot.percent, 0);
        assert!(snapshot.failure_kind.is_none());
        assert!(!snapshot.cancelled);
    }

    #[test]
    fn success_sets_url_and_full_percent() {
        let mut job = job();
        job.mark_succeeded(OutputArtifact::new(
            "https://cdn.test/v.mp4",
            Some("mp4".to_string()),
        ));
        let mut snapshot = JobSnapshot::new(&job, GenerationFeature::ImageToVideo);
        snapshot.apply_job(&job);

        assert_eq!(snapshot.percent, COMPLETE_PERCENT);
        assert_eq!(snapshot.result_url.as_deref(), Some("https://cdn.test/v.mp4"));
        assert_eq!(snapshot.media_type_hint.as_deref(), Some("mp4"));
    }

    #[test]
    fn timeout_suggests_manual_retry() {
        let mut job = job();
        job.mark_timed_out();
        let snapshot = JobSnapshot::new(&job, GenerationFeature::TextToVideo);

        assert_eq!(snapshot.failure_kind, Some(JobErrorKind::JobTimedOut));
        assert!(snapshot.retry_suggested);
        assert!(snapshot.detail.is_some());
        assert_eq!(
            snapshot.message.as_deref(),
            Some(JobErrorKind::JobTimedOut.user_message())
        );
    }

    #[test]
    fn progress_never_lowers_percent() {
        let mut snapshot = JobSnapshot::new(&job(), GenerationFeature::ImageEdit);
        let update = |percent| ProgressUpdate {
            job_id: "job-1".to_string(),
            state: JobState::Running,
            percent,
            attempts: 1,
            retrying: false,
        };
        snapshot.apply_progress(&update(40));
        snapshot.apply_progress(&update(20));
        assert_eq!(snapshot.percent, 40);
    }

    #[tokio::test]
    async fn unknown_job_is_not_found() {
        let tracker = JobTracker::new(Duration::from_secs(1));
        assert!(matches!(
            tracker.snapshot("missing").await,
            Err(CoreError::NotFound { .. })
        ));
        assert!(matches!(
            tracker.cancel("missing").await,
            Err(CoreError::NotFound { .. })
        ));
    }
}
