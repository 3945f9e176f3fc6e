// Domain Layer - Pure business logic and entities

pub mod error;
pub mod job;
pub mod selection;
pub mod showtime;

// Re-exports
pub use error::DomainError;
pub use job::{Job, JobId, JobStatus, JobStatusView};
pub use selection::SelectionKey;
pub use showtime::{NewShowtime, Showtime, ShowtimeId};
