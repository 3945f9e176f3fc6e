// Log Export Service - create / status / download use cases

use crate::application::worker::{JobRunner, JobTask};
use crate::domain::{JobId, JobStatus, JobStatusView, SelectionKey};
use crate::error::{AppError, Result};
use crate::port::JobRegistry;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// A completed job's artifact, opened for reading
#[derive(Debug)]
pub struct ArtifactDownload {
    pub job_id: JobId,
    pub file_name: String,
    pub size_bytes: u64,
    /// Byte stream over the artifact (`tokio::io::AsyncRead`)
    pub file: tokio::fs::File,
}

/// Outcome of a download request
#[derive(Debug)]
pub enum DownloadOutcome {
    Ready(ArtifactDownload),
    /// The job is not `COMPLETED`; carries its current status
    NotReady(JobStatus),
}

/// Log Export Service
pub struct LogExportService {
    registry: Arc<dyn JobRegistry>,
    runner: Arc<JobRunner>,
}

impl LogExportService {
    pub fn new(registry: Arc<dyn JobRegistry>, runner: Arc<JobRunner>) -> Self {
        Self { registry, runner }
    }

    /// Validate the date, register the job and hand it to the pool
    ///
    /// Returns as soon as the job is registered; the export itself runs on a worker.
    ///
    /// # Errors
    /// `AppError::Validation` for a malformed date (no job is created)
    pub async fn create(&self, raw_date: &str) -> Result<JobId> {
        let selection_key =
            SelectionKey::parse(raw_date).map_err(|e| AppError::Validation(e.to_string()))?;

        let job_id = self.registry.create_job(selection_key.token()).await?;
        info!(job_id, date = %selection_key, "Export job created");

        if let Err(e) = self.runner.submit(JobTask {
            job_id,
            selection_key,
        }) {
            warn!(job_id, error = %e, "Could not dispatch export job");
            self.registry.mark_failed(job_id, &e.to_string()).await?;
        }

        Ok(job_id)
    }

    /// Current status of a job
    pub async fn status(&self, job_id: JobId) -> Result<JobStatusView> {
        let job = self
            .registry
            .get_job(job_id)
            .await?
            .ok_or_else(|| job_not_found(job_id))?;
        Ok(job.status_view())
    }

    /// Open the artifact of a completed job
    ///
    /// Any other status yields `DownloadOutcome::NotReady` carrying that status.
    ///
    /// # Errors
    /// - `AppError::NotFound` for an unknown job, or an artifact already swept
    /// - `AppError::Io` if the artifact exists but cannot be opened
    pub async fn download(&self, job_id: JobId) -> Result<DownloadOutcome> {
        let job = self
            .registry
            .get_job(job_id)
            .await?
            .ok_or_else(|| job_not_found(job_id))?;

        if job.status != JobStatus::Completed {
            info!(job_id, status = %job.status, "Artifact requested before completion");
            return Ok(DownloadOutcome::NotReady(job.status));
        }

        let path = job.artifact_path.as_deref().ok_or_else(|| {
            AppError::Internal(format!("job {} completed without an artifact", job_id))
        })?;

        let file = match tokio::fs::File::open(path).await {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(AppError::NotFound(format!(
                    "artifact for job {} is no longer available",
                    job_id
                )));
            }
            Err(e) => return Err(AppError::Io(e)),
        };
        let size_bytes = file.metadata().await?.len();
        let file_name = Path::new(path)
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| format!("logs-{}.log", job_id));

        Ok(DownloadOutcome::Ready(ArtifactDownload {
            job_id,
            file_name,
            size_bytes,
            file,
        }))
    }
}

fn job_not_found(job_id: JobId) -> AppError {
    AppError::NotFound(format!("export job {} not found", job_id))
}
