// Job Registry Port (Interface)

use crate::domain::{Job, JobId, JobStatus};
use crate::error::Result;
use async_trait::async_trait;

/// Directory of export jobs and their lifecycle state
///
/// Every method is individually atomic; callers may interleave them arbitrarily.
/// A reader never observes a half-applied transition.
#[async_trait]
pub trait JobRegistry: Send + Sync {
    /// Reserve the next id and store a new `IN_PROGRESS` job
    ///
    /// Ids are unique and strictly increasing, even under concurrent calls.
    async fn create_job(&self, selection_key: &str) -> Result<JobId>;

    /// Find job by ID
    async fn get_job(&self, id: JobId) -> Result<Option<Job>>;

    /// `IN_PROGRESS -> COMPLETED`
    ///
    /// Unknown ids are a no-op. A job that is already terminal yields
    /// `AppError::Domain(InvalidStateTransition)`.
    async fn mark_completed(&self, id: JobId, artifact_path: &str) -> Result<()>;

    /// `IN_PROGRESS -> FAILED`
    ///
    /// Same unknown-id and terminal-state rules as [`JobRegistry::mark_completed`].
    async fn mark_failed(&self, id: JobId, error_message: &str) -> Result<()>;

    /// Drop terminal jobs that finished before `before_millis`
    ///
    /// # Returns
    /// Number of job records removed
    async fn purge_finished(&self, before_millis: i64) -> Result<usize>;

    /// Count jobs by status
    async fn count_by_status(&self, status: JobStatus) -> Result<usize>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use crate::error::AppError;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Mutex;

    /// Registry double that also records every terminal write it receives
    #[derive(Default)]
    pub struct RecordingJobRegistry {
        next_id: AtomicU64,
        jobs: Mutex<HashMap<JobId, Job>>,
        writes: Mutex<Vec<(JobId, JobStatus)>>,
    }

    impl RecordingJobRegistry {
        pub fn new() -> Self {
            Self::default()
        }

        /// Terminal writes in arrival order, including ones for unknown ids
        pub fn writes(&self) -> Vec<(JobId, JobStatus)> {
            self.writes.lock().unwrap().clone()
        }

        fn transition(
            &self,
            id: JobId,
            to: JobStatus,
            apply: impl FnOnce(&mut Job) -> crate::domain::error::Result<()>,
        ) -> Result<()> {
            self.writes.lock().unwrap().push((id, to));
            match self.jobs.lock().unwrap().get_mut(&id) {
                Some(job) => apply(job).map_err(AppError::from),
                None => Ok(()),
            }
        }
    }

    #[async_trait]
    impl JobRegistry for RecordingJobRegistry {
        async fn create_job(&self, selection_key: &str) -> Result<JobId> {
            let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
            self.jobs
                .lock()
                .unwrap()
                .insert(id, Job::new(id, selection_key, 0));
            Ok(id)
        }

        async fn get_job(&self, id: JobId) -> Result<Option<Job>> {
            Ok(self.jobs.lock().unwrap().get(&id).cloned())
        }

        async fn mark_completed(&self, id: JobId, artifact_path: &str) -> Result<()> {
            self.transition(id, JobStatus::Completed, |job| job.complete(artifact_path, 1))
        }

        async fn mark_failed(&self, id: JobId, error_message: &str) -> Result<()> {
            self.transition(id, JobStatus::Failed, |job| job.fail(error_message, 1))
        }

        async fn purge_finished(&self, before_millis: i64) -> Result<usize> {
            let mut jobs = self.jobs.lock().unwrap();
            let before = jobs.len();
            jobs.retain(|_, job| !job.finished_at.is_some_and(|at| at < before_millis));
            Ok(before - jobs.len())
        }

        async fn count_by_status(&self, status: JobStatus) -> Result<usize> {
            Ok(self
                .jobs
                .lock()
                .unwrap()
                .values()
                .filter(|job| job.status == status)
                .count())
        }
    }
}
