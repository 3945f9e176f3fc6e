// Showtime Repository Port (backing store fronted by the side-cache)

use crate::domain::{NewShowtime, Showtime, ShowtimeId};
use crate::error::Result;
use async_trait::async_trait;

/// Repository interface for Showtime persistence
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ShowtimeRepository: Send + Sync {
    /// Insert a new showtime, assigning its id
    async fn insert(&self, showtime: NewShowtime) -> Result<Showtime>;

    /// Find showtime by ID
    async fn find_by_id(&self, id: ShowtimeId) -> Result<Option<Showtime>>;

    /// All showtimes, ordered by id
    async fn find_all(&self) -> Result<Vec<Showtime>>;

    /// Replace an existing showtime (returns false if the id is unknown)
    async fn update(&self, showtime: &Showtime) -> Result<bool>;

    /// Delete by ID (returns false if the id is unknown)
    async fn delete(&self, id: ShowtimeId) -> Result<bool>;
}
