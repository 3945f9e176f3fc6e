// Cinema Infrastructure - Filesystem Adapters
// Implements: ArtifactProducer (log file export), ArtifactMaintenance (artifact sweeps)

mod artifact_name;
mod log_file_producer;
mod maintenance_impl;

pub use artifact_name::{artifact_file_name, is_artifact_file_name};
pub use log_file_producer::{LogFileArtifactProducer, LogFileProducerConfig};
pub use maintenance_impl::FsArtifactMaintenance;
