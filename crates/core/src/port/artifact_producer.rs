// Artifact Producer Port
// Abstraction for the slow, fallible filter-and-materialize step a job runs

use crate::domain::{JobId, SelectionKey};
use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;

/// A materialized artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub path: PathBuf,
    pub record_count: usize,
    pub size_bytes: u64,
}

/// Production errors
///
/// All of these end up as the failed job's message; none escape the worker.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProductionError {
    #[error("no log records for date {0}")]
    NoMatchingRecords(String),

    #[error("{0}")]
    SourceUnavailable(String),

    #[error("failed to write artifact: {0}")]
    ArtifactWrite(String),
}

/// Artifact Producer trait
///
/// Implementations:
/// - LogFileArtifactProducer: filters a line-oriented log file by date prefix
#[async_trait]
pub trait ArtifactProducer: Send + Sync {
    /// Filter the source by `key` and materialize the matching records
    ///
    /// # Errors
    /// - ProductionError::NoMatchingRecords if nothing matches
    /// - ProductionError::SourceUnavailable if the source cannot be read
    ///   (the I/O message is carried verbatim)
    /// - ProductionError::ArtifactWrite if the artifact cannot be written
    async fn produce(&self, job_id: JobId, key: &SelectionKey)
        -> Result<Artifact, ProductionError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::sync::Semaphore;

    /// Mock producer behavior
    #[derive(Debug, Clone)]
    pub enum MockBehavior {
        /// Succeed with an artifact at `<dir>/job-<id>.log`
        Success(PathBuf),
        /// Fail as if nothing matched
        NoMatches,
        /// Fail as if the source could not be read
        SourceUnavailable(String),
        /// Panic with message (for panic isolation testing)
        Panic(String),
    }

    /// Mock Artifact Producer for testing
    ///
    /// A gated mock parks every call until the test releases permits, which keeps
    /// jobs observably `IN_PROGRESS`.
    pub struct MockArtifactProducer {
        behavior: MockBehavior,
        gate: Option<Arc<Semaphore>>,
        call_count: AtomicUsize,
    }

    impl MockArtifactProducer {
        pub fn new(behavior: MockBehavior) -> Self {
            Self {
                behavior,
                gate: None,
                call_count: AtomicUsize::new(0),
            }
        }

        /// Producer that waits for a permit per call; returns the gate
        pub fn gated(behavior: MockBehavior) -> (Self, Arc<Semaphore>) {
            let gate = Arc::new(Semaphore::new(0));
            let producer = Self {
                behavior,
                gate: Some(Arc::clone(&gate)),
                call_count: AtomicUsize::new(0),
            };
            (producer, gate)
        }

        pub fn new_success(dir: impl Into<PathBuf>) -> Self {
            Self::new(MockBehavior::Success(dir.into()))
        }

        pub fn new_panic_inducing(message: impl Into<String>) -> Self {
            Self::new(MockBehavior::Panic(message.into()))
        }

        pub fn call_count(&self) -> usize {
            self.call_count.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ArtifactProducer for MockArtifactProducer {
        async fn produce(
            &self,
            job_id: JobId,
            key: &SelectionKey,
        ) -> Result<Artifact, ProductionError> {
            self.call_count.fetch_add(1, Ordering::SeqCst);

            if let Some(gate) = &self.gate {
                // Closing the semaphore releases every waiter.
                if let Ok(permit) = gate.acquire().await {
                    permit.forget();
                }
            }

            match &self.behavior {
                MockBehavior::Success(dir) => Ok(Artifact {
                    path: dir.join(format!("job-{}.log", job_id)),
                    record_count: 1,
                    size_bytes: 0,
                }),
                MockBehavior::NoMatches => {
                    Err(ProductionError::NoMatchingRecords(key.to_string()))
                }
                MockBehavior::SourceUnavailable(msg) => {
                    Err(ProductionError::SourceUnavailable(msg.clone()))
                }
                MockBehavior::Panic(msg) => {
                    panic!("{}", msg); // Actually panic for panic isolation testing
                }
            }
        }
    }
}
