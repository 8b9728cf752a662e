use std::collections::BTreeMap;
use std::time::Duration;

use mediagen_core::error::CoreError;
use mediagen_core::feature::GenerationFeature;
use mediagen_core::polling::PollConfig;

/// Default HTTP request timeout. Covers a queue-retried submission under
/// the vendor client's default timeouts.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;

/// Server configuration loaded from environment variables.
///
/// All fields except the per-feature workflows have defaults suitable for
/// local development. A feature without a configured workflow is disabled.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `120`).
    ///
    /// Must exceed the vendor's worst-case submission time, see
    /// [`check_submission_budget`](Self::check_submission_budget).
    pub request_timeout_secs: u64,
    /// Graceful shutdown timeout in seconds (default: `30`).
    pub shutdown_timeout_secs: u64,
    /// Vendor workflow id per enabled feature.
    pub workflows: BTreeMap<GenerationFeature, String>,
    /// Overrides every feature's poll interval when set.
    pub poll_interval_ms: Option<u64>,
    /// Overrides every feature's poll attempt bound when set.
    pub poll_max_attempts: Option<u32>,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                  | Default                 |
    /// |--------------------------|-------------------------|
    /// | `HOST`                   | `0.0.0.0`               |
    /// | `PORT`                   | `3000`                  |
    /// | `CORS_ORIGINS`           | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS`   | `120`                   |
    /// | `SHUTDOWN_TIMEOUT_SECS`  | `30`                    |
    /// | `WORKFLOW_<FEATURE>`     | unset (feature off)     |
    /// | `POLL_INTERVAL_MS`       | per-feature default     |
    /// | `POLL_MAX_ATTEMPTS`      | per-feature default     |
    ///
    /// `<FEATURE>` is the feature slug in upper snake case, e.g.
    /// `WORKFLOW_IMAGE_TO_VIDEO`.
    pub fn from_env() -> Result<Self, CoreError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, CoreError> {
        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".into());

        let port: u16 = parse_or(&lookup, "PORT", 3000)?;

        let cors_origins: Vec<String> = lookup("CORS_ORIGINS")
            .unwrap_or_else(|| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = parse_or(&lookup, "REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS)?;
        let shutdown_timeout_secs: u64 = parse_or(&lookup, "SHUTDOWN_TIMEOUT_SECS", 30)?;

        let workflows = GenerationFeature::ALL
            .into_iter()
            .filter_map(|feature| {
                lookup(&format!("WORKFLOW_{}", feature.env_suffix()))
                    .map(|id| id.trim().to_string())
                    .filter(|id| !id.is_empty())
                    .map(|id| (feature, id))
            })
            .collect();

        let poll_interval_ms = parse_optional(&lookup, "POLL_INTERVAL_MS")?;
        let poll_max_attempts = parse_optional(&lookup, "POLL_MAX_ATTEMPTS")?;

        let config = Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
            workflows,
            poll_interval_ms,
            poll_max_attempts,
        };
        for feature in GenerationFeature::ALL {
            config.poll_config_for(feature).validate()?;
        }
        Ok(config)
    }

    /// Workflow id for `feature`, if the feature is enabled.
    pub fn workflow_for(&self, feature: GenerationFeature) -> Option<&str> {
        self.workflows.get(&feature).map(String::as_str)
    }

    /// Poll budget for `feature`: its default with any overrides applied.
    ///
    /// When only the interval is overridden, the expected duration is
    /// rescaled so the progress estimate keeps its shape.
    pub fn poll_config_for(&self, feature: GenerationFeature) -> PollConfig {
        let mut config = feature.default_poll_config();
        if let Some(ms) = self.poll_interval_ms {
            let interval = Duration::from_millis(ms);
            let polls = config.expected_duration.as_secs_f64() / config.interval.as_secs_f64();
            config.expected_duration = interval.mul_f64(polls);
            config.interval = interval;
        }
        if let Some(max_attempts) = self.poll_max_attempts {
            config.max_attempts = max_attempts;
        }
        config
    }

    /// Reject a request timeout that a queue-retried submission can outlast.
    ///
    /// `budget` is the vendor client's worst-case submission time. A
    /// shorter request timeout answers 408 while the vendor may still be
    /// accepting the job.
    pub fn check_submission_budget(&self, budget: Duration) -> Result<(), CoreError> {
        let timeout = Duration::from_secs(self.request_timeout_secs);
        if timeout <= budget {
            return Err(CoreError::Validation(format!(
                "REQUEST_TIMEOUT_SECS ({}) must exceed the worst-case submission time of {} s; \
                 raise it or lower the vendor request timeout / queue retries",
                self.request_timeout_secs,
                budget.as_secs()
            )));
        }
        Ok(())
    }

    /// Features with a configured workflow, in slug order.
    pub fn enabled_features(&self) -> impl Iterator<Item = GenerationFeature> + '_ {
        self.workflows.keys().copied()
    }
}

fn parse_or<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, CoreError> {
    Ok(parse_optional(lookup, key)?.unwrap_or(default))
}

fn parse_optional<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<T>, CoreError> {
    lookup(key)
        .map(|raw| parse_value(key, &raw))
        .transpose()
}

fn parse_value<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T, CoreError> {
    raw.trim().parse().map_err(|_| {
        CoreError::Validation(format!(
            "{key} must be a valid {}, got '{raw}'",
            std::any::type_name::<T>()
        ))
    })
}
