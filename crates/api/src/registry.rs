//! File references issued by this server.
//!
//! A generation request may only bind file references that came out of
//! `POST /api/v1/uploads`; anything else is rejected before it reaches the
//! vendor. References expire after [`UPLOAD_RETENTION_SECS`] and are pruned
//! whenever a new upload is recorded.

use std::collections::HashMap;

use chrono::Utc;
use tokio::sync::RwLock;

use mediagen_core::error::CoreError;
use mediagen_core::request::FileRef;
use mediagen_core::types::Timestamp;

/// Issued references stay bindable for this long.
pub const UPLOAD_RETENTION_SECS: i64 = 24 * 3600;

#[derive(Default)]
pub struct UploadRegistry {
    refs: RwLock<HashMap<FileRef, Timestamp>>,
}

impl UploadRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn record(&self, file_ref: FileRef) {
        self.record_at(file_ref, Utc::now()).await;
    }

    /// Record `file_ref` as issued at `issued_at`, dropping expired entries.
    pub async fn record_at(&self, file_ref: FileRef, issued_at: Timestamp) {
        let mut refs = self.refs.write().await;
        refs.retain(|_, issued| !is_expired(*issued, issued_at));
        refs.insert(file_ref, issued_at);
    }

    /// Resolve a client-supplied reference to one this server issued.
    pub async fn resolve(&self, raw: &str) -> Result<FileRef, CoreError> {
        let file_ref = FileRef::from_upload(raw)?;
        match self.refs.read().await.get(&file_ref) {
            Some(issued) if !is_expired(*issued, Utc::now()) => Ok(file_ref),
            Some(_) => Err(CoreError::Validation(format!(
                "file_ref '{raw}' has expired; upload the file again"
            ))),
            None => Err(CoreError::Validation(format!(
                "file_ref '{raw}' was not issued by this server; upload the file first"
            ))),
        }
    }

    pub async fn len(&self) -> usize {
        self.refs.read().await.len()
    }
}

fn is_expired(issued: Timestamp, now: Timestamp) -> bool {
    (now - issued).num_seconds() > UPLOAD_RETENTION_SECS
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn file_ref(raw: &str) -> FileRef {
        FileRef::from_upload(raw).unwrap()
    }

    #[tokio::test]
    async fn only_recorded_refs_resolve() {
        let registry = UploadRegistry::new();
        registry.record(file_ref("api/cat.png")).await;

        assert_eq!(registry.resolve("api/cat.png").await.unwrap().as_str(), "api/cat.png");
        assert!(registry.resolve("api/dog.png").await.is_err());
        assert!(registry.resolve("").await.is_err());
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn recording_prunes_expired_refs() {
        let registry = UploadRegistry::new();
        let now = Utc::now();
        let stale = now - Duration::seconds(UPLOAD_RETENTION_SECS + 60);
        registry.record_at(file_ref("api/old.png"), stale).await;
        registry
            .record_at(file_ref("api/recent.png"), now - Duration::hours(1))
            .await;
        assert_eq!(registry.len().await, 2);

        registry.record_at(file_ref("api/new.png"), now).await;

        assert_eq!(registry.len().await, 2);
        assert!(registry.resolve("api/old.png").await.is_err());
        assert!(registry.resolve("api/recent.png").await.is_ok());
    }

    #[tokio::test]
    async fn expired_ref_no_longer_resolves() {
        let registry = UploadRegistry::new();
        let stale = Utc::now() - Duration::seconds(UPLOAD_RETENTION_SECS + 1);
        registry.record_at(file_ref("api/old.png"), stale).await;

        let err = registry.resolve("api/old.png").await.unwrap_err();
        assert!(err.to_string().contains("expired"));
    }
}
