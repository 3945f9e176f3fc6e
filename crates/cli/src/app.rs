//! Command handlers: wire the adapters into the core services and report results.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use colored::Colorize;
use tabled::{Table, Tabled};
use tracing::{info, warn};

use cinema_core::application::worker::constants::STATUS_POLL_INTERVAL;
use cinema_core::application::{
    stop_signal, DownloadOutcome, JobRunner, LogExportService, MaintenanceScheduler,
    ShowtimeService, VisitCounter,
};
use cinema_core::domain::{JobId, JobStatus, JobStatusView, NewShowtime};
use cinema_core::port::time_provider::SystemTimeProvider;
use cinema_core::port::{ArtifactMaintenance, JobRegistry, TimeProvider};
use cinema_infra_fs::{FsArtifactMaintenance, LogFileArtifactProducer, LogFileProducerConfig};
use cinema_infra_memory::{InMemoryJobRegistry, InMemoryShowtimeRepository};

use crate::cli::{ExportArgs, ShowtimesArgs, SweepArgs};
use crate::settings::Settings;

#[derive(Tabled)]
struct ExportRow {
    job_id: String,
    date: String,
    status: String,
    result: String,
}

#[derive(Tabled)]
struct StatsRow {
    artifacts: usize,
    bytes: u64,
    deleted: usize,
    directory: String,
}

#[derive(Tabled)]
struct LookupRow {
    id: u64,
    film: String,
    frequency: String,
    cached: usize,
}

/// `cinema-jobs export`
pub async fn export(settings: &Settings, args: &ExportArgs) -> Result<()> {
    ensure_distinct_dirs(&args.out, &settings.export.artifact_dir).await?;

    let time_provider: Arc<dyn TimeProvider> = Arc::new(SystemTimeProvider);
    let registry: Arc<dyn JobRegistry> = Arc::new(InMemoryJobRegistry::new(time_provider.clone()));
    let producer = Arc::new(LogFileArtifactProducer::new(LogFileProducerConfig {
        source_path: settings.export.source.clone(),
        artifact_dir: settings.export.artifact_dir.clone(),
        processing_delay: settings.export.processing_delay,
    }));
    let maintenance: Arc<dyn ArtifactMaintenance> =
        Arc::new(FsArtifactMaintenance::new(&settings.export.artifact_dir));

    let runner = Arc::new(JobRunner::start(
        settings.export.workers,
        registry.clone(),
        producer,
    ));
    let service = LogExportService::new(registry.clone(), runner.clone());

    let (scheduler_stop, stop_token) = stop_signal();
    let scheduler = MaintenanceScheduler::new(
        registry,
        maintenance.clone(),
        time_provider,
        settings.maintenance.clone(),
    );
    let scheduler_handle = tokio::spawn(scheduler.run(stop_token));

    info!(
        dates = args.dates.len(),
        source = %settings.export.source.display(),
        "Submitting export jobs"
    );

    let mut submitted: Vec<(String, Result<JobId, String>)> = Vec::new();
    for date in &args.dates {
        let outcome = service.create(date).await.map_err(|e| e.to_string());
        submitted.push((date.clone(), outcome));
    }

    let mut rows = Vec::with_capacity(submitted.len());
    let mut failures = 0;
    for (date, outcome) in submitted {
        let row = match outcome {
            Ok(job_id) => {
                let view = wait_for_terminal(&service, job_id).await?;
                let result = match view.status {
                    JobStatus::Completed => match download(&service, job_id, &args.out).await {
                        Ok(path) => path.display().to_string(),
                        Err(e) => {
                            failures += 1;
                            format!("download failed: {:#}", e)
                        }
                    },
                    _ => view.error.clone().unwrap_or_default(),
                };
                if view.status == JobStatus::Failed {
                    failures += 1;
                }
                ExportRow {
                    job_id: job_id.to_string(),
                    date,
                    status: colored_status(view.status),
                    result,
                }
            }
            Err(reason) => {
                failures += 1;
                ExportRow {
                    job_id: "-".to_string(),
                    date,
                    status: "REJECTED".red().to_string(),
                    result: reason,
                }
            }
        };
        rows.push(row);
    }

    runner.shutdown().await;
    scheduler_stop.stop();
    if let Err(e) = scheduler_handle.await {
        warn!(error = ?e, "Maintenance scheduler exited abnormally");
    }

    if !settings.export.keep_artifacts {
        let purged = maintenance.purge_all().await?;
        info!(purged, "Artifact directory cleaned up");
    }

    println!("{}", Table::new(rows));
    if failures == 0 {
        println!("{}", "✓ All exports completed".green().bold());
    } else {
        println!(
            "{}",
            format!("✗ {} of {} exports did not complete", failures, args.dates.len())
                .yellow()
                .bold()
        );
    }

    Ok(())
}

/// Downloads copy over artifacts of the same name, so the two directories must differ
///
/// Both are created up front: a directory that does not exist yet cannot be
/// canonicalized, and two missing paths may still name the same place.
async fn ensure_distinct_dirs(out_dir: &Path, artifact_dir: &Path) -> Result<()> {
    let out = resolve_dir(out_dir).await?;
    let artifacts = resolve_dir(artifact_dir).await?;
    if out == artifacts {
        anyhow::bail!(
            "--out must differ from the artifact directory ({})",
            artifact_dir.display()
        );
    }
    Ok(())
}

async fn resolve_dir(dir: &Path) -> Result<PathBuf> {
    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("Failed to create {}", dir.display()))?;
    tokio::fs::canonicalize(dir)
        .await
        .with_context(|| format!("Failed to resolve {}", dir.display()))
}

/// Poll until the job leaves `IN_PROGRESS`
async fn wait_for_terminal(service: &LogExportService, job_id: JobId) -> Result<JobStatusView> {
    loop {
        let view = service.status(job_id).await?;
        if view.status.is_terminal() {
            return Ok(view);
        }
        tokio::time::sleep(STATUS_POLL_INTERVAL).await;
    }
}

/// Copy a completed artifact into `out_dir`
async fn download(service: &LogExportService, job_id: JobId, out_dir: &Path) -> Result<PathBuf> {
    let mut artifact = match service.download(job_id).await? {
        DownloadOutcome::Ready(artifact) => artifact,
        DownloadOutcome::NotReady(status) => {
            anyhow::bail!("job {} is {} and has no artifact", job_id, status)
        }
    };

    tokio::fs::create_dir_all(out_dir)
        .await
        .with_context(|| format!("Failed to create {}", out_dir.display()))?;
    let target = out_dir.join(&artifact.file_name);
    let mut file = tokio::fs::File::create(&target)
        .await
        .with_context(|| format!("Failed to create {}", target.display()))?;
    let copied = tokio::io::copy(&mut artifact.file, &mut file).await?;

    info!(job_id, bytes = copied, path = %target.display(), "Artifact downloaded");
    Ok(target)
}

fn colored_status(status: JobStatus) -> String {
    match status {
        JobStatus::Completed => status.to_string().green().to_string(),
        JobStatus::Failed => status.to_string().red().to_string(),
        JobStatus::InProgress => status.to_string().yellow().to_string(),
    }
}

/// `cinema-jobs sweep`
///
/// Job records live in process memory, so a standalone sweep only has artifacts to
/// act on.
pub async fn sweep(settings: &Settings, args: &SweepArgs) -> Result<()> {
    let maintenance: Arc<dyn ArtifactMaintenance> =
        Arc::new(FsArtifactMaintenance::new(&settings.export.artifact_dir));

    let (deleted, stats) = if args.all {
        let deleted = maintenance.purge_all().await?;
        (deleted, maintenance.stats().await?)
    } else {
        let time_provider: Arc<dyn TimeProvider> = Arc::new(SystemTimeProvider);
        let registry = Arc::new(InMemoryJobRegistry::new(time_provider.clone()));
        let scheduler = MaintenanceScheduler::new(
            registry,
            maintenance,
            time_provider,
            settings.maintenance.clone(),
        );
        let report = scheduler.run_now().await?;
        (report.artifacts_deleted, report.stats)
    };

    println!("{}", "Artifact sweep".cyan().bold());
    println!(
        "{}",
        Table::new(vec![StatsRow {
            artifacts: stats.artifact_count,
            bytes: stats.artifact_bytes,
            deleted,
            directory: settings.export.artifact_dir.display().to_string(),
        }])
    );
    Ok(())
}

/// `cinema-jobs showtimes`
pub async fn showtimes(settings: &Settings, args: &ShowtimesArgs) -> Result<()> {
    let service = ShowtimeService::new(
        Arc::new(InMemoryShowtimeRepository::new()),
        settings.cache.showtime_capacity,
        Arc::new(VisitCounter::new()),
    );

    for (title, day, hall_id) in SAMPLE_SHOWTIMES {
        let starts_at = NaiveDate::from_ymd_opt(2025, 1, *day)
            .and_then(|date| date.and_hms_opt(19, 30, 0))
            .context("invalid sample showtime")?;
        service
            .create(NewShowtime {
                film_title: title.to_string(),
                starts_at,
                hall_id: *hall_id,
            })
            .await?;
    }
    // Start from a cold cache so lookups show the eviction order
    service.clear_cache();

    let lookups = if args.lookups.is_empty() {
        DEFAULT_LOOKUPS.to_vec()
    } else {
        args.lookups.clone()
    };

    let mut rows = Vec::with_capacity(lookups.len());
    for id in lookups {
        match service.get(id).await {
            Ok(showtime) => rows.push(LookupRow {
                id,
                film: showtime.film_title,
                frequency: service
                    .cached_frequency(id)
                    .map(|f| f.to_string())
                    .unwrap_or_else(|| "-".to_string()),
                cached: service.cached_len(),
            }),
            Err(e) => println!("  {} {}", "✗".red(), e),
        }
    }

    let all = service.list_all().await?;
    println!(
        "{}",
        format!(
            "Showtime cache (capacity {})",
            settings.cache.showtime_capacity
        )
        .cyan()
        .bold()
    );
    println!("{}", Table::new(rows));
    println!(
        "  {} {} showtimes, {} visits",
        "Listing:".bold(),
        all.len(),
        service.visits()
    );
    Ok(())
}

const SAMPLE_SHOWTIMES: &[(&str, u32, u64)] = &[
    ("Solaris", 15, 1),
    ("Stalker", 15, 2),
    ("Mirror", 16, 1),
    ("Andrei Rublev", 16, 3),
    ("Ivan's Childhood", 17, 2),
];

const DEFAULT_LOOKUPS: &[u64] = &[1, 1, 2, 3, 4, 1, 5, 2];
