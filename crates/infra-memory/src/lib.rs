// Cinema Infrastructure - In-Memory Adapter
// Implements: JobRegistry, ShowtimeRepository

mod job_registry;
mod showtime_repository;

pub use job_registry::InMemoryJobRegistry;
pub use showtime_repository::InMemoryShowtimeRepository;
