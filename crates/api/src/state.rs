use std::sync::Arc;

use mediagen_runninghub::AsyncJobClient;

use crate::config::ServerConfig;
use crate::registry::UploadRegistry;
use crate::tracker::JobTracker;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// Server configuration (bind address, CORS, feature workflows).
    pub config: Arc<ServerConfig>,
    /// Vendor job client shared by every feature.
    pub client: Arc<AsyncJobClient>,
    /// Polling tasks and snapshots of submitted jobs.
    pub tracker: Arc<JobTracker>,
    /// File references issued by the upload route.
    pub uploads: Arc<UploadRegistry>,
}
