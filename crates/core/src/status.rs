//! Vendor status-token classification.
//!
//! The vendor spells the same state several ways across endpoints
//! (`SUCCESS` vs `COMPLETED`, `FAILED` vs `ERROR`). [`StatusVocabulary`]
//! holds those spellings as data so new ones can be added through
//! configuration. Unknown tokens always classify as running.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Default spellings meaning the job finished successfully.
pub const DEFAULT_SUCCESS_TOKENS: &[&str] = &["SUCCESS", "COMPLETED"];
/// Default spellings meaning the job failed.
pub const DEFAULT_FAILURE_TOKENS: &[&str] = &["FAILED", "ERROR"];
/// Default spellings meaning the job is still in progress.
pub const DEFAULT_RUNNING_TOKENS: &[&str] = &["RUNNING", "PENDING", "QUEUED"];

/// Internal tri-state every vendor token maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusClass {
    Running,
    Succeeded,
    Failed,
}

/// Token lists used to classify vendor status strings.
///
/// Matching is case-insensitive and ignores surrounding whitespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusVocabulary {
    pub success: Vec<String>,
    pub failure: Vec<String>,
    pub running: Vec<String>,
}

impl Default for StatusVocabulary {
    fn default() -> Self {
        Self {
            success: owned(DEFAULT_SUCCESS_TOKENS),
            failure: owned(DEFAULT_FAILURE_TOKENS),
            running: owned(DEFAULT_RUNNING_TOKENS),
        }
    }
}

impl StatusVocabulary {
    /// Classify a raw vendor token.
    ///
    /// Success is checked before failure so a token configured in both
    /// lists never reports a false negative.
    pub fn classify(&self, token: &str) -> StatusClass {
        let token = token.trim();
        if contains_token(&self.success, token) {
            StatusClass::Succeeded
        } else if contains_token(&self.failure, token) {
            StatusClass::Failed
        } else {
            StatusClass::Running
        }
    }

    /// Whether `token` is listed anywhere in the vocabulary.
    pub fn is_known(&self, token: &str) -> bool {
        let token = token.trim();
        contains_token(&self.success, token)
            || contains_token(&self.failure, token)
            || contains_token(&self.running, token)
    }

    /// Reject empty success or failure lists, which would make jobs
    /// unable to ever reach that terminal state.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.success.iter().all(|t| t.trim().is_empty()) {
            return Err(CoreError::Validation(
                "Status vocabulary needs at least one success token".to_string(),
            ));
        }
        if self.failure.iter().all(|t| t.trim().is_empty()) {
            return Err(CoreError::Validation(
                "Status vocabulary needs at least one failure token".to_string(),
            ));
        }
        Ok(())
    }
}

/// Split a comma-separated token list, dropping blanks.
pub fn parse_token_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn owned(tokens: &[&str]) -> Vec<String> {
    tokens.iter().map(|t| t.to_string()).collect()
}

fn contains_token(list: &[String], token: &str) -> bool {
    list.iter().any(|t| t.trim().eq_ignore_ascii_case(token))
}
