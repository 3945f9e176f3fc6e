// Log file artifact producer
use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};

use crate::artifact_name::artifact_file_name;
use cinema_core::domain::{JobId, SelectionKey};
use cinema_core::port::{Artifact, ArtifactProducer, ProductionError};

/// Where the producer reads from and writes to
#[derive(Debug, Clone)]
pub struct LogFileProducerConfig {
    /// Line-oriented log file to filter
    pub source_path: PathBuf,
    /// Directory receiving artifact files (created on demand)
    pub artifact_dir: PathBuf,
    /// Artificial pause before each export (simulates a slow backend)
    pub processing_delay: Duration,
}

/// Exports the lines of a log file that start with the job's date
pub struct LogFileArtifactProducer {
    config: LogFileProducerConfig,
}

impl LogFileArtifactProducer {
    /// Create a new producer
    ///
    /// # Example
    /// ```ignore
    /// let producer = LogFileArtifactProducer::new(LogFileProducerConfig {
    ///     source_path: "./cinema.log".into(),
    ///     artifact_dir: std::env::temp_dir().join("cinema-artifacts"),
    ///     processing_delay: Duration::ZERO,
    /// });
    /// ```
    pub fn new(config: LogFileProducerConfig) -> Self {
        Self { config }
    }

    /// Matching lines, original order, each terminated by `\n`
    fn filter_records(content: &str, key: &SelectionKey) -> (String, usize) {
        let mut body = String::new();
        let mut count = 0;
        for line in content.lines().filter(|line| key.matches(line)) {
            body.push_str(line);
            body.push('\n');
            count += 1;
        }
        (body, count)
    }
}

#[async_trait]
impl ArtifactProducer for LogFileArtifactProducer {
    async fn produce(
        &self,
        job_id: JobId,
        key: &SelectionKey,
    ) -> Result<Artifact, ProductionError> {
        if !self.config.processing_delay.is_zero() {
            debug!(
                job_id,
                delay_ms = self.config.processing_delay.as_millis() as u64,
                "Delaying export"
            );
            tokio::time::sleep(self.config.processing_delay).await;
        }

        let content = tokio::fs::read_to_string(&self.config.source_path)
            .await
            .map_err(|e| ProductionError::SourceUnavailable(e.to_string()))?;

        let (body, record_count) = Self::filter_records(&content, key);
        if record_count == 0 {
            return Err(ProductionError::NoMatchingRecords(key.to_string()));
        }

        tokio::fs::create_dir_all(&self.config.artifact_dir)
            .await
            .map_err(|e| ProductionError::ArtifactWrite(e.to_string()))?;

        let path = self
            .config
            .artifact_dir
            .join(artifact_file_name(key, job_id));
        tokio::fs::write(&path, body.as_bytes())
            .await
            .map_err(|e| ProductionError::ArtifactWrite(e.to_string()))?;

        info!(
            job_id,
            date = %key,
            records = record_count,
            path = %path.display(),
            "Artifact written"
        );

        Ok(Artifact {
            path,
            record_count,
            size_bytes: body.len() as u64,
        })
    }
}
