// Filesystem artifact maintenance
use async_trait::async_trait;
use cinema_core::error::Result;
use cinema_core::port::{ArtifactMaintenance, MaintenanceStats};
use std::io::ErrorKind;
use std::path::PathBuf;
use std::time::{Duration, SystemTime};
use tracing::{debug, info, warn};

use crate::artifact_name::is_artifact_file_name;

/// An artifact found on disk
struct ArtifactEntry {
    path: PathBuf,
    size_bytes: u64,
    modified: SystemTime,
}

/// Sweeps the artifact directory
///
/// Only files named exactly like generated artifacts (`logs-<date>-<job id>-<uuid>.log`)
/// are ever touched, so the directory may be shared with other content.
pub struct FsArtifactMaintenance {
    artifact_dir: PathBuf,
}

impl FsArtifactMaintenance {
    pub fn new(artifact_dir: impl Into<PathBuf>) -> Self {
        Self {
            artifact_dir: artifact_dir.into(),
        }
    }

    /// Artifacts currently on disk. A missing directory holds none.
    async fn list_artifacts(&self) -> Result<Vec<ArtifactEntry>> {
        let mut dir = match tokio::fs::read_dir(&self.artifact_dir).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut entries = Vec::new();
        while let Some(entry) = dir.next_entry().await? {
            let name = entry.file_name();
            if !name.to_str().map(is_artifact_file_name).unwrap_or(false) {
                continue;
            }

            // Deleted between listing and stat: skip
            let metadata = match entry.metadata().await {
                Ok(metadata) if metadata.is_file() => metadata,
                Ok(_) => continue,
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            };

            entries.push(ArtifactEntry {
                path: entry.path(),
                size_bytes: metadata.len(),
                modified: metadata.modified().unwrap_or_else(|_| SystemTime::now()),
            });
        }
        Ok(entries)
    }

    async fn remove(&self, entry: &ArtifactEntry) -> bool {
        match tokio::fs::remove_file(&entry.path).await {
            Ok(()) => {
                debug!(path = %entry.path.display(), "Deleted artifact");
                true
            }
            // Not critical - someone else already removed it
            Err(e) if e.kind() == ErrorKind::NotFound => false,
            Err(e) => {
                warn!(path = %entry.path.display(), error = %e, "Failed to delete artifact");
                false
            }
        }
    }
}

#[async_trait]
impl ArtifactMaintenance for FsArtifactMaintenance {
    async fn gc_artifacts(&self, retention: Duration) -> Result<usize> {
        let cutoff = SystemTime::now()
            .checked_sub(retention)
            .unwrap_or(SystemTime::UNIX_EPOCH);

        let mut deleted = 0;
        for entry in self.list_artifacts().await? {
            if entry.modified <= cutoff && self.remove(&entry).await {
                deleted += 1;
            }
        }

        if deleted > 0 {
            info!(
                deleted_artifacts = deleted,
                retention_secs = retention.as_secs(),
                "Artifact GC completed"
            );
        }
        Ok(deleted)
    }

    async fn purge_all(&self) -> Result<usize> {
        let mut deleted = 0;
        for entry in self.list_artifacts().await? {
            if self.remove(&entry).await {
                deleted += 1;
            }
        }
        info!(deleted_artifacts = deleted, dir = %self.artifact_dir.display(), "Artifacts purged");
        Ok(deleted)
    }

    async fn stats(&self) -> Result<MaintenanceStats> {
        let entries = self.list_artifacts().await?;
        Ok(MaintenanceStats {
            artifact_count: entries.len(),
            artifact_bytes: entries.iter().map(|entry| entry.size_bytes).sum(),
        })
    }
}
