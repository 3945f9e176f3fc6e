// Application Layer - Use Cases and Business Logic

pub mod log_export;
pub mod maintenance;
pub mod showtime;
pub mod visit_counter;
pub mod worker;

// Re-exports
pub use log_export::{ArtifactDownload, DownloadOutcome, LogExportService};
pub use maintenance::{stop_signal, MaintenanceReport, MaintenanceScheduler, StopHandle, StopToken};
pub use showtime::ShowtimeService;
pub use visit_counter::VisitCounter;
pub use worker::{JobRunner, JobTask, Worker};
