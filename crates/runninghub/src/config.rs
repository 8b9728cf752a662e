//! Vendor configuration.
//!
//! Credentials and the base URL are injected into
//! [`AsyncJobClient`](crate::AsyncJobClient) at construction; nothing in
//! this crate reads ambient state after that.

use std::time::Duration;

use mediagen_core::error::CoreError;
use mediagen_core::polling::RetryPolicy;
use mediagen_core::status::{parse_token_list, StatusVocabulary};

/// Vendor code the queue-full rejection has been observed with.
pub const DEFAULT_QUEUE_FULL_CODE: i64 = 421;
/// Message marker the queue-full rejection has been observed with.
pub const DEFAULT_QUEUE_FULL_MARKER: &str = "TASK_QUEUE_MAXED";
/// Timeout for a single HTTP call to the vendor.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Everything needed to talk to one RunningHub account.
#[derive(Debug, Clone)]
pub struct RunningHubConfig {
    /// Base URL, e.g. `https://www.runninghub.ai/task/openapi`. No trailing slash.
    pub base_url: String,
    pub api_key: String,
    pub request_timeout: Duration,
    /// Vendor codes meaning "queue full, try again shortly".
    pub queue_full_codes: Vec<i64>,
    /// Message fragment meaning the same, for responses with another code.
    pub queue_full_marker: String,
    pub vocabulary: StatusVocabulary,
    /// Resubmission policy for queue-saturated requests.
    pub queue_retry: RetryPolicy,
    /// In-place retry policy for failed status calls.
    pub transport_retry: RetryPolicy,
}

impl RunningHubConfig {
    /// Config with defaults for everything except the endpoint and key.
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            queue_full_codes: vec![DEFAULT_QUEUE_FULL_CODE],
            queue_full_marker: DEFAULT_QUEUE_FULL_MARKER.to_string(),
            vocabulary: StatusVocabulary::default(),
            queue_retry: RetryPolicy::queue_saturation(),
            transport_retry: RetryPolicy::poll_transport(),
        }
    }

    /// Load configuration from environment variables.
    ///
    /// | Env Var                           | Default                 |
    /// |-----------------------------------|-------------------------|
    /// | `RUNNINGHUB_BASE_URL`             | required                |
    /// | `RUNNINGHUB_API_KEY`              | required                |
    /// | `RUNNINGHUB_REQUEST_TIMEOUT_SECS` | `30`                    |
    /// | `RUNNINGHUB_QUEUE_FULL_CODES`     | `421`                   |
    /// | `RUNNINGHUB_SUCCESS_TOKENS`       | `SUCCESS,COMPLETED`     |
    /// | `RUNNINGHUB_FAILURE_TOKENS`       | `FAILED,ERROR`          |
    /// | `RUNNINGHUB_RUNNING_TOKENS`       | `RUNNING,PENDING,QUEUED`|
    pub fn from_env() -> Result<Self, CoreError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, CoreError> {
        let required = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| CoreError::Validation(format!("{key} must be set")))
        };

        let mut config = Self::new(
            required("RUNNINGHUB_BASE_URL")?,
            required("RUNNINGHUB_API_KEY")?,
        );

        if let Some(raw) = lookup("RUNNINGHUB_REQUEST_TIMEOUT_SECS") {
            let secs: u64 = raw.trim().parse().map_err(|_| {
                CoreError::Validation(format!(
                    "RUNNINGHUB_REQUEST_TIMEOUT_SECS must be a valid u64, got '{raw}'"
                ))
            })?;
            config.request_timeout = Duration::from_secs(secs);
        }

        if let Some(raw) = lookup("RUNNINGHUB_QUEUE_FULL_CODES") {
            config.queue_full_codes = parse_token_list(&raw)
                .iter()
                .map(|code| {
                    code.parse::<i64>().map_err(|_| {
                        CoreError::Validation(format!(
                            "RUNNINGHUB_QUEUE_FULL_CODES contains a non-integer '{code}'"
                        ))
                    })
                })
                .collect::<Result<_, _>>()?;
        }

        if let Some(raw) = lookup("RUNNINGHUB_SUCCESS_TOKENS") {
            config.vocabulary.success = parse_token_list(&raw);
        }
        if let Some(raw) = lookup("RUNNINGHUB_FAILURE_TOKENS") {
            config.vocabulary.failure = parse_token_list(&raw);
        }
        if let Some(raw) = lookup("RUNNINGHUB_RUNNING_TOKENS") {
            config.vocabulary.running = parse_token_list(&raw);
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(CoreError::Validation(format!(
                "RunningHub base URL must start with http:// or https://, got: '{}'",
                self.base_url
            )));
        }
        if self.api_key.trim().is_empty() {
            return Err(CoreError::Validation(
                "RunningHub API key must not be empty".to_string(),
            ));
        }
        if self.queue_retry.max_attempts == 0 || self.transport_retry.max_attempts == 0 {
            return Err(CoreError::Validation(
                "Retry policies need at least one attempt".to_string(),
            ));
        }
        self.vocabulary.validate()
    }

    /// Whether a rejected response means "queue full".
    pub fn is_queue_full(&self, code: i64, message: Option<&str>) -> bool {
        self.queue_full_codes.contains(&code)
            || message.is_some_and(|m| {
                !self.queue_full_marker.is_empty() && m.contains(self.queue_full_marker.as_str())
            })
    }

    /// Worst-case wall time of one queue-retried submission: every try
    /// running into the request timeout, plus the delays between tries.
    pub fn submission_budget(&self) -> Duration {
        let tries = self.queue_retry.max_attempts;
        self.request_timeout.saturating_mul(tries)
            + self.queue_retry.delay.saturating_mul(tries.saturating_sub(1))
    }

    /// Full URL of a vendor endpoint.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}
