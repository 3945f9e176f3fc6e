//! Showtime service over the in-memory repository

use std::num::NonZeroUsize;
use std::sync::Arc;

use chrono::NaiveDate;
use cinema_core::application::{ShowtimeService, VisitCounter};
use cinema_core::domain::{NewShowtime, Showtime};
use cinema_core::AppError;
use cinema_infra_memory::InMemoryShowtimeRepository;

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

async fn seeded(capacity: usize, titles: &[&str]) -> (ShowtimeService, Vec<Showtime>) {
    let service = ShowtimeService::new(
        Arc::new(InMemoryShowtimeRepository::new()),
        NonZeroUsize::new(capacity).unwrap(),
        Arc::new(VisitCounter::new()),
    );
    let mut created = Vec::new();
    for title in titles {
        created.push(service.create(new_showtime(title)).await.unwrap());
    }
    service.clear_cache();
    (service, created)
}

#[tokio::test]
async fn test_least_frequent_showtime_is_evicted_first() {
    let (service, _) = seeded(2, &["Solaris", "Stalker", "Mirror"]).await;

    service.get(1).await.unwrap();
    service.get(1).await.unwrap();
    service.get(2).await.unwrap();
    // Full: 2 has the lowest frequency and goes
    service.get(3).await.unwrap();

    assert_eq!(service.cached_len(), 2);
    assert!(service.cached_frequency(1).is_some());
    assert_eq!(service.cached_frequency(2), None);
    assert!(service.cached_frequency(3).is_some());
}

#[tokio::test]
async fn test_writes_keep_cache_and_repository_in_step() {
    let (service, created) = seeded(3, &["Solaris", "Stalker"]).await;

    let mut renamed = created[0].clone();
    renamed.film_title = "Solaris (restored)".to_string();
    service.update(renamed).await.unwrap();
    assert_eq!(
        service.get(created[0].id).await.unwrap().film_title,
        "Solaris (restored)"
    );

    service.delete(created[1].id).await.unwrap();
    assert!(matches!(
        service.get(created[1].id).await.unwrap_err(),
        AppError::NotFound(_)
    ));

    let listed = service.list_all().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].film_title, "Solaris (restored)");
    assert_eq!(service.visits(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_reads_stay_within_capacity() {
    let titles: Vec<String> = (0..10).map(|i| format!("Film {}", i)).collect();
    let refs: Vec<&str> = titles.iter().map(String::as_str).collect();
    let (service, _) = seeded(3, &refs).await;
    let service = Arc::new(service);

    let mut tasks = tokio::task::JoinSet::new();
    for worker in 0..8u64 {
        let service = Arc::clone(&service);
        tasks.spawn(async move {
            for i in 0..50u64 {
                let id = (worker + i) % 10 + 1;
                assert_eq!(service.get(id).await.unwrap().id, id);
            }
        });
    }
    while let Some(result) = tasks.join_next().await {
        result.unwrap();
    }

    assert!(service.cached_len() <= 3);
}
