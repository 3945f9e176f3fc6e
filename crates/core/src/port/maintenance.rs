// Artifact Maintenance port
use crate::error::Result;
use async_trait::async_trait;
use std::time::Duration;

/// Artifact storage statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MaintenanceStats {
    pub artifact_count: usize,
    pub artifact_bytes: u64,
}

/// Maintenance configuration
#[derive(Debug, Clone)]
pub struct MaintenanceConfig {
    /// How long finished job records stay queryable
    pub job_retention: Duration,

    /// How long artifact files survive on disk
    pub artifact_retention: Duration,

    /// Pause between scheduled passes
    pub interval: Duration,
}

impl Default for MaintenanceConfig {
    fn default() -> Self {
        Self {
            job_retention: Duration::from_secs(24 * 60 * 60), // 1 day
            artifact_retention: Duration::from_secs(60 * 60), // 1 hour
            interval: Duration::from_secs(10 * 60),           // every 10 minutes
        }
    }
}

/// Cleanup operations on ephemeral artifact storage
#[async_trait]
pub trait ArtifactMaintenance: Send + Sync {
    /// Delete artifacts older than `retention`
    ///
    /// # Returns
    /// Number of artifacts deleted
    async fn gc_artifacts(&self, retention: Duration) -> Result<usize>;

    /// Delete every artifact (shutdown cleanup)
    async fn purge_all(&self) -> Result<usize>;

    /// Get storage statistics
    async fn stats(&self) -> Result<MaintenanceStats>;
}
