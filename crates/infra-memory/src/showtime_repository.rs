// In-memory ShowtimeRepository Implementation

use async_trait::async_trait;
use cinema_core::domain::{NewShowtime, Showtime, ShowtimeId};
use cinema_core::error::Result;
use cinema_core::port::ShowtimeRepository;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Backing store stand-in for showtimes, ordered by id
#[derive(Default)]
pub struct InMemoryShowtimeRepository {
    inner: Mutex<Store>,
}

#[derive(Default)]
struct Store {
    last_id: ShowtimeId,
    rows: BTreeMap<ShowtimeId, Showtime>,
}

impl InMemoryShowtimeRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Store> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl ShowtimeRepository for InMemoryShowtimeRepository {
    async fn insert(&self, showtime: NewShowtime) -> Result<Showtime> {
        let mut store = self.lock();
        store.last_id += 1;
        let saved = showtime.into_showtime(store.last_id);
        store.rows.insert(saved.id, saved.clone());
        Ok(saved)
    }

    async fn find_by_id(&self, id: ShowtimeId) -> Result<Option<Showtime>> {
        Ok(self.lock().rows.get(&id).cloned())
    }

    async fn find_all(&self) -> Result<Vec<Showtime>> {
        Ok(self.lock().rows.values().cloned().collect())
    }

    async fn update(&self, showtime: &Showtime) -> Result<bool> {
        let mut store = self.lock();
        match store.rows.get_mut(&showtime.id) {
            Some(row) => {
                *row = showtime.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: ShowtimeId) -> Result<bool> {
        Ok(self.lock().rows.remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tokio_test::assert_ok;

    fn new_showtime(title: &str) -> NewShowtime {
        NewShowtime {
            film_title: title.to_string(),
            starts_at: NaiveDate::from_ymd_opt(2025, 1, 15)
                .unwrap()
                .and_hms_opt(20, 0, 0)
                .unwrap(),
            hall_id: 1,
        }
    }

    #[tokio::test]
    async fn test_insert_assigns_sequential_ids() {
        let repo = InMemoryShowtimeRepository::new();

        let a = assert_ok!(repo.insert(new_showtime("A")).await);
        let b = assert_ok!(repo.insert(new_showtime("B")).await);

        assert_eq!((a.id, b.id), (1, 2));
        assert_eq!(repo.find_by_id(2).await.unwrap(), Some(b));
        let titles: Vec<_> = repo
            .find_all()
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.film_title)
            .collect();
        assert_eq!(titles, vec!["A", "B"]);
    }

    #[tokio::test]
    async fn test_update_and_delete_report_missing_rows() {
        let repo = InMemoryShowtimeRepository::new();
        let mut saved = repo.insert(new_showtime("A")).await.unwrap();

        saved.film_title = "A (restored)".to_string();
        assert!(repo.update(&saved).await.unwrap());
        assert_eq!(
            repo.find_by_id(saved.id).await.unwrap().unwrap().film_title,
            "A (restored)"
        );

        assert!(repo.delete(saved.id).await.unwrap());
        assert!(!repo.delete(saved.id).await.unwrap());
        assert!(!repo.update(&saved).await.unwrap());
    }
}
