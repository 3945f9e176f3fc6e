// Maintenance Service
// Scheduled cleanup of finished job records and ephemeral artifacts

mod stop;

pub use stop::{stop_signal, StopHandle, StopToken};

use crate::error::Result;
use crate::port::{
    ArtifactMaintenance, JobRegistry, MaintenanceConfig, MaintenanceStats, TimeProvider,
};
use std::sync::Arc;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info};

/// What one maintenance pass did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaintenanceReport {
    pub jobs_purged: usize,
    pub artifacts_deleted: usize,
    pub stats: MaintenanceStats,
}

/// Maintenance scheduler
///
/// Replaces "delete on process exit" with an explicit TTL policy: finished job
/// records and artifact files each have their own retention.
pub struct MaintenanceScheduler {
    registry: Arc<dyn JobRegistry>,
    maintenance: Arc<dyn ArtifactMaintenance>,
    time_provider: Arc<dyn TimeProvider>,
    config: MaintenanceConfig,
}

impl MaintenanceScheduler {
    pub fn new(
        registry: Arc<dyn JobRegistry>,
        maintenance: Arc<dyn ArtifactMaintenance>,
        time_provider: Arc<dyn TimeProvider>,
        config: MaintenanceConfig,
    ) -> Self {
        Self {
            registry,
            maintenance,
            time_provider,
            config,
        }
    }

    /// Run maintenance loop (background task) until stopped
    ///
    /// Should be spawned in tokio::spawn
    pub async fn run(self, mut stop: StopToken) {
        info!(
            interval_secs = self.config.interval.as_secs(),
            artifact_retention_secs = self.config.artifact_retention.as_secs(),
            job_retention_secs = self.config.job_retention.as_secs(),
            "Maintenance scheduler started"
        );

        let mut tick = interval(self.config.interval);
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = tick.tick() => {
                    if let Err(e) = self.run_now().await {
                        error!(error = ?e, "Scheduled maintenance failed");
                    }
                }
                _ = stop.stopped() => {
                    info!("Maintenance scheduler stopped");
                    break;
                }
            }
        }
    }

    /// Run one maintenance pass immediately
    pub async fn run_now(&self) -> Result<MaintenanceReport> {
        let now = self.time_provider.now_millis();
        let job_cutoff = now.saturating_sub(retention_millis(&self.config));

        let jobs_purged = self.registry.purge_finished(job_cutoff).await?;
        let artifacts_deleted = self
            .maintenance
            .gc_artifacts(self.config.artifact_retention)
            .await?;
        let stats = self.maintenance.stats().await?;

        info!(
            jobs_purged,
            artifacts_deleted,
            artifact_count = stats.artifact_count,
            artifact_bytes = stats.artifact_bytes,
            "Maintenance completed"
        );

        Ok(MaintenanceReport {
            jobs_purged,
            artifacts_deleted,
            stats,
        })
    }
}

fn retention_millis(config: &MaintenanceConfig) -> i64 {
    i64::try_from(config.job_retention.as_millis()).unwrap_or(i64::MAX)
}
