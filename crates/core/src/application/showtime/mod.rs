// Showtime Service - repository access behind an LFU side-cache

use crate::application::visit_counter::VisitCounter;
use crate::cache::SharedCache;
use crate::domain::{NewShowtime, Showtime, ShowtimeId};
use crate::error::{AppError, Result};
use crate::port::ShowtimeRepository;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tracing::debug;

/// Showtime Service
///
/// Reads go to the cache first and fall back to the repository; every write goes
/// to the repository and then refreshes or drops the cached copy.
pub struct ShowtimeService {
    repo: Arc<dyn ShowtimeRepository>,
    cache: SharedCache<Showtime>,
    visits: Arc<VisitCounter>,
}

impl ShowtimeService {
    pub fn new(
        repo: Arc<dyn ShowtimeRepository>,
        cache_capacity: NonZeroUsize,
        visits: Arc<VisitCounter>,
    ) -> Self {
        Self {
            repo,
            cache: SharedCache::new("showtime", cache_capacity),
            visits,
        }
    }

    pub async fn create(&self, new: NewShowtime) -> Result<Showtime> {
        let showtime = self.repo.insert(new).await?;
        self.cache.put(showtime.id, showtime.clone());
        Ok(showtime)
    }

    /// Read-through lookup
    pub async fn get(&self, id: ShowtimeId) -> Result<Showtime> {
        if let Some(showtime) = self.cache.get(id) {
            return Ok(showtime);
        }

        debug!(showtime_id = id, "Showtime cache miss");
        let showtime = self
            .repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| showtime_not_found(id))?;
        self.cache.put(id, showtime.clone());
        Ok(showtime)
    }

    /// All showtimes straight from the repository; counts as a visit
    pub async fn list_all(&self) -> Result<Vec<Showtime>> {
        self.visits.increment();
        self.repo.find_all().await
    }

    pub async fn update(&self, showtime: Showtime) -> Result<Showtime> {
        if !self.repo.update(&showtime).await? {
            return Err(showtime_not_found(showtime.id));
        }
        self.cache.put(showtime.id, showtime.clone());
        Ok(showtime)
    }

    pub async fn delete(&self, id: ShowtimeId) -> Result<()> {
        if !self.repo.delete(id).await? {
            return Err(showtime_not_found(id));
        }
        self.cache.remove(id);
        Ok(())
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Number of cached showtimes
    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }

    /// Access count of a cached showtime; `None` when it is not cached
    pub fn cached_frequency(&self, id: ShowtimeId) -> Option<u64> {
        self.cache.frequency(id)
    }

    pub fn visits(&self) -> u64 {
        self.visits.count()
    }
}

fn showtime_not_found(id: ShowtimeId) -> AppError {
    AppError::NotFound(format!("Showtime not found with id {}", id))
}
