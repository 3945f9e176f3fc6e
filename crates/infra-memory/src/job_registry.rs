// In-memory JobRegistry Implementation

use async_trait::async_trait;
use cinema_core::domain::{Job, JobId, JobStatus};
use cinema_core::error::{AppError, Result};
use cinema_core::port::{JobRegistry, TimeProvider};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info, warn};

/// Process-local job directory
///
/// Ids come from an atomic counter starting at 1. Each job is replaced as a whole
/// under the write lock, so status, artifact path and error message always change
/// together.
pub struct InMemoryJobRegistry {
    next_id: AtomicU64,
    jobs: RwLock<HashMap<JobId, Job>>,
    time_provider: Arc<dyn TimeProvider>,
}

impl InMemoryJobRegistry {
    pub fn new(time_provider: Arc<dyn TimeProvider>) -> Self {
        Self {
            next_id: AtomicU64::new(1),
            jobs: RwLock::new(HashMap::new()),
            time_provider,
        }
    }

    /// Number of job records currently held
    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    // Guards never cover a partially applied transition (see `transition`), so a
    // poisoned lock still protects a consistent map.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<JobId, Job>> {
        self.jobs.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<JobId, Job>> {
        self.jobs.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply a transition to a copy and swap it in only if it succeeded
    fn transition(
        &self,
        id: JobId,
        apply: impl FnOnce(&mut Job, i64) -> cinema_core::domain::error::Result<()>,
    ) -> Result<()> {
        let now = self.time_provider.now_millis();
        let mut jobs = self.write();
        let Some(current) = jobs.get(&id) else {
            warn!(job_id = id, "Transition for unknown job ignored");
            return Ok(());
        };

        let mut updated = current.clone();
        apply(&mut updated, now).map_err(AppError::from)?;
        debug!(job_id = id, status = %updated.status, "Job transitioned");
        jobs.insert(id, updated);
        Ok(())
    }
}

#[async_trait]
impl JobRegistry for InMemoryJobRegistry {
    async fn create_job(&self, selection_key: &str) -> Result<JobId> {
        let created_at = self.time_provider.now_millis();
        let mut jobs = self.write();
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        jobs.insert(id, Job::new(id, selection_key, created_at));
        debug!(job_id = id, selection_key, "Job registered");
        Ok(id)
    }

    async fn get_job(&self, id: JobId) -> Result<Option<Job>> {
        Ok(self.read().get(&id).cloned())
    }

    async fn mark_completed(&self, id: JobId, artifact_path: &str) -> Result<()> {
        self.transition(id, |job, now| job.complete(artifact_path, now))
    }

    async fn mark_failed(&self, id: JobId, error_message: &str) -> Result<()> {
        self.transition(id, |job, now| job.fail(error_message, now))
    }

    async fn purge_finished(&self, before_millis: i64) -> Result<usize> {
        let mut jobs = self.write();
        let before = jobs.len();
        jobs.retain(|_, job| match job.finished_at {
            Some(finished_at) => finished_at >= before_millis,
            None => true,
        });
        let purged = before - jobs.len();
        if purged > 0 {
            info!(purged, cutoff = before_millis, "Purged finished jobs");
        }
        Ok(purged)
    }

    async fn count_by_status(&self, status: JobStatus) -> Result<usize> {
        Ok(self
            .read()
            .values()
            .filter(|job| job.status == status)
            .count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cinema_core::domain::DomainError;
    use cinema_core::port::time_provider::mocks::ManualTimeProvider;
    use cinema_core::port::time_provider::SystemTimeProvider;
    use std::collections::HashSet;

    fn registry() -> InMemoryJobRegistry {
        InMemoryJobRegistry::new(Arc::new(SystemTimeProvider))
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let registry = registry();

        let id = registry.create_job("15-01-2025").await.unwrap();
        assert_eq!(id, 1);

        let job = registry.get_job(id).await.unwrap().unwrap();
        assert_eq!(job.id, 1);
        assert_eq!(job.status, JobStatus::InProgress);
        assert_eq!(job.selection_key, "15-01-2025");
        assert!(registry.get_job(2).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_ids_are_strictly_increasing() {
        let registry = registry();
        let mut previous = 0;
        for _ in 0..50 {
            let id = registry.create_job("15-01-2025").await.unwrap();
            assert!(id > previous);
            previous = id;
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_create_yields_distinct_ids() {
        let registry = Arc::new(registry());
        let mut tasks = tokio::task::JoinSet::new();
        for _ in 0..64 {
            let registry = Arc::clone(&registry);
            tasks.spawn(async move {
                let mut ids = Vec::new();
                for _ in 0..10 {
                    ids.push(registry.create_job("15-01-2025").await.unwrap());
                }
                ids
            });
        }

        let mut all = HashSet::new();
        while let Some(ids) = tasks.join_next().await {
            for id in ids.unwrap() {
                assert!(all.insert(id), "duplicate id {}", id);
            }
        }

        assert_eq!(all.len(), 640);
        assert_eq!(registry.len(), 640);
        assert_eq!(
            registry.count_by_status(JobStatus::InProgress).await.unwrap(),
            640
        );
    }

    #[tokio::test]
    async fn test_mark_completed_sets_status_and_path() {
        let clock = Arc::new(ManualTimeProvider::new(1_000));
        let registry = InMemoryJobRegistry::new(clock.clone());
        let id = registry.create_job("15-01-2025").await.unwrap();

        clock.advance(250);
        registry.mark_completed(id, "/tmp/logs.log").await.unwrap();

        let job = registry.get_job(id).await.unwrap().unwrap();
        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.artifact_path.as_deref(), Some("/tmp/logs.log"));
        assert_eq!(job.created_at, 1_000);
        assert_eq!(job.finished_at, Some(1_250));
    }

    #[tokio::test]
    async fn test_unknown_id_transitions_are_noops() {
        let registry = registry();

        registry.mark_completed(77, "/tmp/x.log").await.unwrap();
        registry.mark_failed(78, "boom").await.unwrap();

        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_second_terminal_write_is_rejected_and_state_kept() {
        let registry = registry();
        let id = registry.create_job("15-01-2025").await.unwrap();
        registry.mark_failed(id, "no log records").await.unwrap();

        let err = registry.mark_completed(id, "/tmp/x.log").await.unwrap_err();
        assert!(matches!(
            err,
            AppError::Domain(DomainError::InvalidStateTransition { .. })
        ));

        let job = registry.get_job(id).await.unwrap().unwrap();
        assert_eq!(job.status, JobStatus::Failed);
        assert!(job.artifact_path.is_none());
        assert_eq!(job.error_message.as_deref(), Some("no log records"));
    }

    #[tokio::test]
    async fn test_purge_finished_keeps_running_and_recent_jobs() {
        let clock = Arc::new(ManualTimeProvider::new(0));
        let registry = InMemoryJobRegistry::new(clock.clone());

        let old = registry.create_job("15-01-2025").await.unwrap();
        registry.mark_completed(old, "/tmp/old.log").await.unwrap(); // finished at 0
        let running = registry.create_job("15-01-2025").await.unwrap();
        clock.advance(1_000);
        let recent = registry.create_job("15-01-2025").await.unwrap();
        registry.mark_failed(recent, "boom").await.unwrap(); // finished at 1000

        let purged = registry.purge_finished(500).await.unwrap();

        assert_eq!(purged, 1);
        assert!(registry.get_job(old).await.unwrap().is_none());
        assert!(registry.get_job(running).await.unwrap().is_some());
        assert!(registry.get_job(recent).await.unwrap().is_some());

        // Ids are never reused after a purge
        assert_eq!(registry.create_job("15-01-2025").await.unwrap(), 4);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_readers_never_see_torn_completion() {
        let registry = Arc::new(registry());
        let ids: Vec<JobId> = {
            let mut ids = Vec::new();
            for _ in 0..200 {
                ids.push(registry.create_job("15-01-2025").await.unwrap());
            }
            ids
        };

        let writer = {
            let registry = Arc::clone(&registry);
            let ids = ids.clone();
            tokio::spawn(async move {
                for id in ids {
                    registry
                        .mark_completed(id, &format!("/tmp/{}.log", id))
                        .await
                        .unwrap();
                }
            })
        };

        let reader = {
            let registry = Arc::clone(&registry);
            tokio::spawn(async move {
                for _ in 0..20 {
                    for id in &ids {
                        let job = registry.get_job(*id).await.unwrap().unwrap();
                        if job.status == JobStatus::Completed {
                            assert!(job.artifact_path.is_some());
                            assert!(job.finished_at.is_some());
                        }
                    }
                    tokio::task::yield_now().await;
                }
            })
        };

        writer.await.unwrap();
        reader.await.unwrap();
    }
}
