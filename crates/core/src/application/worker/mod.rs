// Worker pool - runs export jobs off the caller's thread

pub mod constants;
mod panic_guard;

use constants::*;
pub use panic_guard::panic_message;

use crate::domain::{JobId, SelectionKey};
use crate::error::{AppError, Result};
use crate::port::{ArtifactProducer, JobRegistry};
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Unit of work handed from the creator to the pool
#[derive(Debug, Clone)]
pub struct JobTask {
    pub job_id: JobId,
    pub selection_key: SelectionKey,
}

type TaskQueue = Arc<tokio::sync::Mutex<mpsc::UnboundedReceiver<JobTask>>>;

/// Worker executes tasks pulled from the shared queue
///
/// The worker is the only writer of a job's state after creation and writes the
/// terminal state exactly once per task.
pub struct Worker {
    index: usize,
    registry: Arc<dyn JobRegistry>,
    producer: Arc<dyn ArtifactProducer>,
}

impl Worker {
    pub fn new(
        index: usize,
        registry: Arc<dyn JobRegistry>,
        producer: Arc<dyn ArtifactProducer>,
    ) -> Self {
        Self {
            index,
            registry,
            producer,
        }
    }

    /// Pull tasks until the queue is closed and drained
    async fn run(&self, queue: TaskQueue) {
        info!(worker = self.index, "Worker started");
        loop {
            // Only one idle worker waits on the receiver; the rest wait on the lock.
            let next = { queue.lock().await.recv().await };
            match next {
                Some(task) => self.process(task).await,
                None => break,
            }
        }
        info!(worker = self.index, "Worker stopped");
    }

    /// Run one task to its terminal state
    pub async fn process(&self, task: JobTask) {
        let JobTask {
            job_id,
            selection_key,
        } = task;
        info!(
            worker = self.index,
            job_id,
            date = %selection_key,
            "Processing export job"
        );

        // Execute in a separate task so a panicking producer cannot take the worker down
        let producer = Arc::clone(&self.producer);
        let handle =
            tokio::spawn(async move { producer.produce(job_id, &selection_key).await });

        let recorded = match handle.await {
            Ok(Ok(artifact)) => {
                info!(
                    job_id,
                    path = %artifact.path.display(),
                    records = artifact.record_count,
                    bytes = artifact.size_bytes,
                    "Export job completed"
                );
                self.registry
                    .mark_completed(job_id, &artifact.path.to_string_lossy())
                    .await
            }
            Ok(Err(e)) => {
                warn!(job_id, error = %e, "Export job failed");
                self.registry.mark_failed(job_id, &e.to_string()).await
            }
            Err(join_err) => {
                let message = if join_err.is_panic() {
                    let payload = join_err.into_panic();
                    format!("export panicked: {}", panic_message(payload.as_ref()))
                } else {
                    "export task was cancelled".to_string()
                };
                error!(job_id, error = %message, "Export job aborted");
                self.registry.mark_failed(job_id, &message).await
            }
        };

        if let Err(e) = recorded {
            error!(job_id, error = %e, "Failed to record job outcome");
        }
    }
}

/// Fixed-size pool of workers fed through an unbounded queue
///
/// `submit` never blocks. There is no cancellation and no retry: a submitted task
/// runs to completion or failure.
pub struct JobRunner {
    sender: Mutex<Option<mpsc::UnboundedSender<JobTask>>>,
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl JobRunner {
    /// Spawn `workers` worker tasks on the current tokio runtime
    pub fn start(
        workers: NonZeroUsize,
        registry: Arc<dyn JobRegistry>,
        producer: Arc<dyn ArtifactProducer>,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let queue: TaskQueue = Arc::new(tokio::sync::Mutex::new(rx));

        let handles = (0..workers.get())
            .map(|index| {
                let worker = Worker::new(index, Arc::clone(&registry), Arc::clone(&producer));
                let queue = Arc::clone(&queue);
                tokio::spawn(async move { worker.run(queue).await })
            })
            .collect();

        info!(workers = workers.get(), "Job runner started");

        Self {
            sender: Mutex::new(Some(tx)),
            handles: Mutex::new(handles),
        }
    }

    /// Worker count derived from the platform's available parallelism
    pub fn default_worker_count() -> NonZeroUsize {
        std::thread::available_parallelism().unwrap_or(
            NonZeroUsize::new(FALLBACK_WORKER_COUNT).unwrap_or(NonZeroUsize::MIN),
        )
    }

    /// Hand a task to the pool and return immediately
    ///
    /// # Errors
    /// `AppError::Internal` once the runner has been shut down
    pub fn submit(&self, task: JobTask) -> Result<()> {
        let sender = self.sender.lock().unwrap_or_else(PoisonError::into_inner);
        let job_id = task.job_id;
        match sender.as_ref() {
            Some(tx) => tx
                .send(task)
                .map_err(|_| AppError::Internal(RUNNER_STOPPED_MESSAGE.to_string())),
            None => {
                warn!(job_id, "Task submitted after shutdown");
                Err(AppError::Internal(RUNNER_STOPPED_MESSAGE.to_string()))
            }
        }
    }

    /// Close the queue and wait for already-queued jobs to finish
    ///
    /// Waits at most [`SHUTDOWN_GRACE_PERIOD`]; workers still busy after that keep
    /// running detached.
    pub async fn shutdown(&self) {
        self.sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let handles = std::mem::take(
            &mut *self.handles.lock().unwrap_or_else(PoisonError::into_inner),
        );

        info!(workers = handles.len(), "Draining job runner");
        let deadline = tokio::time::Instant::now() + SHUTDOWN_GRACE_PERIOD;
        for handle in handles {
            match tokio::time::timeout_at(deadline, handle).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => error!(error = ?e, "Worker exited abnormally"),
                Err(_) => {
                    warn!("Shutdown grace period elapsed with jobs still running");
                    break;
                }
            }
        }
        info!("Job runner stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::JobStatus;
    use crate::port::artifact_producer::mocks::{MockArtifactProducer, MockBehavior};
    use crate::port::job_registry::mocks::RecordingJobRegistry;
    use std::time::Duration;

    fn workers(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    fn key(raw: &str) -> SelectionKey {
        SelectionKey::parse(raw).unwrap()
    }

    async fn wait_terminal(registry: &RecordingJobRegistry, id: JobId) -> JobStatus {
        for _ in 0..200 {
            let job = registry.get_job(id).await.unwrap().unwrap();
            if job.is_terminal() {
                return job.status;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("job {} never reached a terminal state", id);
    }

    #[tokio::test]
    async fn test_success_marks_completed_once() {
        let registry = Arc::new(RecordingJobRegistry::new());
        let producer = Arc::new(MockArtifactProducer::new_success("/tmp/artifacts"));
        let runner = JobRunner::start(workers(2), registry.clone(), producer.clone());

        let id = registry.create_job("15-01-2025").await.unwrap();
        runner
            .submit(JobTask {
                job_id: id,
                selection_key: key("15-01-2025"),
            })
            .unwrap();

        assert_eq!(wait_terminal(&registry, id).await, JobStatus::Completed);
        runner.shutdown().await;

        let job = registry.get_job(id).await.unwrap().unwrap();
        assert_eq!(
            job.artifact_path.as_deref(),
            Some("/tmp/artifacts/job-1.log")
        );
        assert_eq!(registry.writes(), vec![(id, JobStatus::Completed)]);
        assert_eq!(producer.call_count(), 1);
    }

    #[tokio::test]
    async fn test_no_matches_marks_failed_with_message() {
        let registry = Arc::new(RecordingJobRegistry::new());
        let producer = Arc::new(MockArtifactProducer::new(MockBehavior::NoMatches));
        let runner = JobRunner::start(workers(1), registry.clone(), producer);

        let id = registry.create_job("17-01-2025").await.unwrap();
        runner
            .submit(JobTask {
                job_id: id,
                selection_key: key("17-01-2025"),
            })
            .unwrap();

        assert_eq!(wait_terminal(&registry, id).await, JobStatus::Failed);
        let job = registry.get_job(id).await.unwrap().unwrap();
        assert_eq!(
            job.error_message.as_deref(),
            Some("no log records for date 17-01-2025")
        );
        runner.shutdown().await;
    }

    #[tokio::test]
    async fn test_source_error_message_is_verbatim() {
        let registry = Arc::new(RecordingJobRegistry::new());
        let producer = Arc::new(MockArtifactProducer::new(MockBehavior::SourceUnavailable(
            "No such file or directory (os error 2)".to_string(),
        )));
        let runner = JobRunner::start(workers(1), registry.clone(), producer);

        let id = registry.create_job("15-01-2025").await.unwrap();
        runner
            .submit(JobTask {
                job_id: id,
                selection_key: key("15-01-2025"),
            })
            .unwrap();

        assert_eq!(wait_terminal(&registry, id).await, JobStatus::Failed);
        let job = registry.get_job(id).await.unwrap().unwrap();
        assert_eq!(
            job.error_message.as_deref(),
            Some("No such file or directory (os error 2)")
        );
        runner.shutdown().await;
    }

    #[tokio::test]
    async fn test_panic_is_recorded_and_pool_survives() {
        let registry = Arc::new(RecordingJobRegistry::new());
        let producer = Arc::new(MockArtifactProducer::new_panic_inducing("disk on fire"));
        let runner = JobRunner::start(workers(1), registry.clone(), producer.clone());

        let first = registry.create_job("15-01-2025").await.unwrap();
        let second = registry.create_job("16-01-2025").await.unwrap();
        for (id, raw) in [(first, "15-01-2025"), (second, "16-01-2025")] {
            runner
                .submit(JobTask {
                    job_id: id,
                    selection_key: key(raw),
                })
                .unwrap();
        }

        // The single worker must still be alive to process the second task
        assert_eq!(wait_terminal(&registry, first).await, JobStatus::Failed);
        assert_eq!(wait_terminal(&registry, second).await, JobStatus::Failed);

        let job = registry.get_job(first).await.unwrap().unwrap();
        assert_eq!(
            job.error_message.as_deref(),
            Some("export panicked: disk on fire")
        );
        assert_eq!(producer.call_count(), 2);
        runner.shutdown().await;
    }

    #[tokio::test]
    async fn test_unknown_job_id_does_not_crash_worker() {
        let registry = Arc::new(RecordingJobRegistry::new());
        let producer = Arc::new(MockArtifactProducer::new_success("/tmp"));
        let runner = JobRunner::start(workers(1), registry.clone(), producer);

        runner
            .submit(JobTask {
                job_id: 999,
                selection_key: key("15-01-2025"),
            })
            .unwrap();
        let id = registry.create_job("15-01-2025").await.unwrap();
        runner
            .submit(JobTask {
                job_id: id,
                selection_key: key("15-01-2025"),
            })
            .unwrap();

        assert_eq!(wait_terminal(&registry, id).await, JobStatus::Completed);
        assert!(registry.get_job(999).await.unwrap().is_none());
        runner.shutdown().await;
    }

    #[tokio::test]
    async fn test_submit_returns_while_work_is_blocked() {
        let registry = Arc::new(RecordingJobRegistry::new());
        let (producer, gate) = MockArtifactProducer::gated(MockBehavior::NoMatches);
        let runner = JobRunner::start(workers(1), registry.clone(), Arc::new(producer));

        let mut ids = Vec::new();
        for _ in 0..5 {
            let id = registry.create_job("15-01-2025").await.unwrap();
            runner
                .submit(JobTask {
                    job_id: id,
                    selection_key: key("15-01-2025"),
                })
                .unwrap();
            ids.push(id);
        }

        for id in &ids {
            let job = registry.get_job(*id).await.unwrap().unwrap();
            assert_eq!(job.status, JobStatus::InProgress);
        }

        gate.add_permits(ids.len());
        for id in ids {
            assert_eq!(wait_terminal(&registry, id).await, JobStatus::Failed);
        }
        runner.shutdown().await;
    }

    #[tokio::test]
    async fn test_shutdown_drains_queue_then_rejects_submissions() {
        let registry = Arc::new(RecordingJobRegistry::new());
        let producer = Arc::new(MockArtifactProducer::new_success("/tmp"));
        let runner = JobRunner::start(workers(2), registry.clone(), producer);

        let mut ids = Vec::new();
        for _ in 0..10 {
            let id = registry.create_job("15-01-2025").await.unwrap();
            runner
                .submit(JobTask {
                    job_id: id,
                    selection_key: key("15-01-2025"),
                })
                .unwrap();
            ids.push(id);
        }
        runner.shutdown().await;

        for id in ids {
            let job = registry.get_job(id).await.unwrap().unwrap();
            assert_eq!(job.status, JobStatus::Completed);
        }

        let err = runner
            .submit(JobTask {
                job_id: 11,
                selection_key: key("15-01-2025"),
            })
            .unwrap_err();
        assert!(err.to_string().contains(RUNNER_STOPPED_MESSAGE));
    }
}
