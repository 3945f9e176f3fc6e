// Port Layer - Interfaces for external dependencies

pub mod artifact_producer;
pub mod job_registry;
pub mod maintenance;
pub mod showtime_repository;
pub mod time_provider; // For deterministic testing

// Re-exports
pub use artifact_producer::{Artifact, ArtifactProducer, ProductionError};
pub use job_registry::JobRegistry;
pub use maintenance::{ArtifactMaintenance, MaintenanceConfig, MaintenanceStats};
pub use showtime_repository::ShowtimeRepository;
pub use time_provider::TimeProvider;
