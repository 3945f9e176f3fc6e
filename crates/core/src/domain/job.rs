// Job Domain Model

use crate::domain::error::{DomainError, Result};
use serde::{Deserialize, Serialize};

/// Job ID (monotonic, starts at 1)
pub type JobId = u64;

/// Job lifecycle status
///
/// `InProgress` is the only non-terminal state. The legal transitions are
/// `InProgress -> Completed` and `InProgress -> Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    InProgress,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobStatus::InProgress)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobStatus::InProgress => write!(f, "IN_PROGRESS"),
            JobStatus::Completed => write!(f, "COMPLETED"),
            JobStatus::Failed => write!(f, "FAILED"),
        }
    }
}

/// Job Entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub status: JobStatus,
    /// Normalized selection token the job filters on
    pub selection_key: String,
    pub artifact_path: Option<String>,
    pub error_message: Option<String>,

    pub created_at: i64, // epoch ms
    pub finished_at: Option<i64>,
}

impl Job {
    /// Create a new job in `IN_PROGRESS` with no artifact and no error
    ///
    /// # Arguments
    ///
    /// * `id` - Job ID (reserved by the registry, not generated here)
    /// * `selection_key` - Normalized selection token
    /// * `created_at` - Creation timestamp in epoch ms (injected, not system time)
    pub fn new(id: JobId, selection_key: impl Into<String>, created_at: i64) -> Self {
        Self {
            id,
            status: JobStatus::InProgress,
            selection_key: selection_key.into(),
            artifact_path: None,
            error_message: None,
            created_at,
            finished_at: None,
        }
    }

    /// Transition to Completed, recording where the artifact lives
    pub fn complete(&mut self, artifact_path: impl Into<String>, now_millis: i64) -> Result<()> {
        self.ensure_in_progress(JobStatus::Completed)?;
        self.status = JobStatus::Completed;
        self.artifact_path = Some(artifact_path.into());
        self.finished_at = Some(now_millis);
        Ok(())
    }

    /// Transition to Failed, recording the failure message
    pub fn fail(&mut self, error_message: impl Into<String>, now_millis: i64) -> Result<()> {
        self.ensure_in_progress(JobStatus::Failed)?;
        self.status = JobStatus::Failed;
        self.error_message = Some(error_message.into());
        self.finished_at = Some(now_millis);
        Ok(())
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Caller-facing projection of this job
    pub fn status_view(&self) -> JobStatusView {
        JobStatusView {
            id: self.id,
            status: self.status,
            error: self.error_message.clone(),
        }
    }

    fn ensure_in_progress(&self, to: JobStatus) -> Result<()> {
        if self.status != JobStatus::InProgress {
            return Err(DomainError::InvalidStateTransition {
                from: self.status.to_string(),
                to: to.to_string(),
            });
        }
        Ok(())
    }
}

/// What a status query returns: `{status, error?}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobStatusView {
    pub id: JobId,
    pub status: JobStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
