//! Typed settings with layered precedence (file → environment → CLI).

use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use cinema_core::application::JobRunner;
use cinema_core::cache::DEFAULT_SHOWTIME_CACHE_CAPACITY;
use cinema_core::port::MaintenanceConfig;
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

use crate::cli::{Cli, Command, ExportOverrides, LoggingOverrides, ShowtimesArgs, SweepArgs};

const LOCAL_CONFIG_BASENAME: &str = "cinema";
const ENV_PREFIX: &str = "CINEMA";
const DEFAULT_SOURCE: &str = "./cinema.log";
const ARTIFACT_SUBDIR: &str = "artifacts";
const FALLBACK_ARTIFACT_DIR: &str = "cinema-artifacts";

/// Fully-resolved settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub logging: LoggingSettings,
    pub export: ExportSettings,
    pub maintenance: MaintenanceConfig,
    pub cache: CacheSettings,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Clone)]
pub struct ExportSettings {
    pub source: PathBuf,
    pub artifact_dir: PathBuf,
    pub workers: NonZeroUsize,
    pub processing_delay: Duration,
    pub keep_artifacts: bool,
}

#[derive(Debug, Clone)]
pub struct CacheSettings {
    pub showtime_capacity: NonZeroUsize,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &Cli) -> Result<Settings, LoadError> {
    let mut builder =
        Config::builder().add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;

    raw.apply_logging_overrides(&cli.logging);
    match &cli.command {
        Command::Export(args) => raw.apply_export_overrides(&args.overrides),
        Command::Sweep(args) => raw.apply_sweep_overrides(args),
        Command::Showtimes(args) => raw.apply_showtimes_overrides(args),
    }

    Settings::from_raw(raw)
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    logging: RawLoggingSettings,
    export: RawExportSettings,
    maintenance: RawMaintenanceSettings,
    cache: RawCacheSettings,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    format: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawExportSettings {
    source: Option<String>,
    artifact_dir: Option<String>,
    workers: Option<u64>,
    processing_delay_ms: Option<u64>,
    keep_artifacts: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawMaintenanceSettings {
    artifact_retention_secs: Option<u64>,
    job_retention_secs: Option<u64>,
    interval_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawCacheSettings {
    showtime_capacity: Option<u64>,
}

impl RawSettings {
    fn apply_logging_overrides(&mut self, overrides: &LoggingOverrides) {
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(format) = overrides.log_format.as_ref() {
            self.logging.format = Some(format.clone());
        }
    }

    fn apply_export_overrides(&mut self, overrides: &ExportOverrides) {
        if let Some(source) = overrides.source.as_ref() {
            self.export.source = Some(source.clone());
        }
        if let Some(dir) = overrides.artifact_dir.as_ref() {
            self.export.artifact_dir = Some(dir.clone());
        }
        if let Some(workers) = overrides.workers {
            self.export.workers = Some(workers);
        }
        if let Some(delay) = overrides.processing_delay_ms {
            self.export.processing_delay_ms = Some(delay);
        }
        if let Some(keep) = overrides.keep_artifacts {
            self.export.keep_artifacts = Some(keep);
        }
    }

    fn apply_sweep_overrides(&mut self, args: &SweepArgs) {
        if let Some(dir) = args.artifact_dir.as_ref() {
            self.export.artifact_dir = Some(dir.clone());
        }
        if let Some(secs) = args.artifact_retention_secs {
            self.maintenance.artifact_retention_secs = Some(secs);
        }
    }

    fn apply_showtimes_overrides(&mut self, args: &ShowtimesArgs) {
        if let Some(capacity) = args.cache_capacity {
            self.cache.showtime_capacity = Some(capacity);
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        Ok(Self {
            logging: build_logging_settings(raw.logging)?,
            export: build_export_settings(raw.export)?,
            maintenance: build_maintenance_settings(raw.maintenance)?,
            cache: build_cache_settings(raw.cache)?,
        })
    }
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = match logging.format.as_deref().map(str::trim) {
        None | Some("pretty") => LogFormat::Pretty,
        Some("json") => LogFormat::Json,
        Some(other) => {
            return Err(LoadError::invalid(
                "logging.format",
                format!("expected `pretty` or `json`, got `{other}`"),
            ))
        }
    };

    Ok(LoggingSettings { level, format })
}

fn build_export_settings(export: RawExportSettings) -> Result<ExportSettings, LoadError> {
    let source =
        non_empty_path(export.source).unwrap_or_else(|| PathBuf::from(DEFAULT_SOURCE));
    let artifact_dir = non_empty_path(export.artifact_dir).unwrap_or_else(default_artifact_dir);

    let workers = match export.workers {
        Some(value) => non_zero_usize(value, "export.workers")?,
        None => JobRunner::default_worker_count(),
    };

    Ok(ExportSettings {
        source,
        artifact_dir,
        workers,
        processing_delay: Duration::from_millis(export.processing_delay_ms.unwrap_or(0)),
        keep_artifacts: export.keep_artifacts.unwrap_or(false),
    })
}

fn build_maintenance_settings(
    maintenance: RawMaintenanceSettings,
) -> Result<MaintenanceConfig, LoadError> {
    let defaults = MaintenanceConfig::default();

    let interval = match maintenance.interval_secs {
        Some(0) => {
            return Err(LoadError::invalid(
                "maintenance.interval_secs",
                "must be greater than zero",
            ))
        }
        Some(secs) => Duration::from_secs(secs),
        None => defaults.interval,
    };

    Ok(MaintenanceConfig {
        job_retention: maintenance
            .job_retention_secs
            .map(Duration::from_secs)
            .unwrap_or(defaults.job_retention),
        artifact_retention: maintenance
            .artifact_retention_secs
            .map(Duration::from_secs)
            .unwrap_or(defaults.artifact_retention),
        interval,
    })
}

fn build_cache_settings(cache: RawCacheSettings) -> Result<CacheSettings, LoadError> {
    let showtime_capacity = match cache.showtime_capacity {
        Some(value) => non_zero_usize(value, "cache.showtime_capacity")?,
        None => DEFAULT_SHOWTIME_CACHE_CAPACITY,
    };
    Ok(CacheSettings { showtime_capacity })
}

/// Trimmed, `~`-expanded path; blank values count as unset
fn non_empty_path(value: Option<String>) -> Option<PathBuf> {
    let value = value?;
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(PathBuf::from(shellexpand::tilde(trimmed).as_ref()))
}

fn default_artifact_dir() -> PathBuf {
    directories::ProjectDirs::from("", "", "cinema")
        .map(|dirs| dirs.cache_dir().join(ARTIFACT_SUBDIR))
        .unwrap_or_else(|| std::env::temp_dir().join(FALLBACK_ARTIFACT_DIR))
}

fn non_zero_usize(value: u64, key: &'static str) -> Result<NonZeroUsize, LoadError> {
    let value: usize = value
        .try_into()
        .map_err(|_| LoadError::invalid(key, "value exceeds supported range"))?;
    NonZeroUsize::new(value).ok_or_else(|| LoadError::invalid(key, "must be greater than zero"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let settings = Settings::from_raw(RawSettings::default()).expect("valid settings");

        assert_eq!(settings.logging.level, LevelFilter::INFO);
        assert_eq!(settings.logging.format, LogFormat::Pretty);
        assert_eq!(settings.export.source, PathBuf::from(DEFAULT_SOURCE));
        assert!(settings.export.artifact_dir.ends_with(ARTIFACT_SUBDIR)
            || settings.export.artifact_dir.ends_with(FALLBACK_ARTIFACT_DIR));
        assert_eq!(settings.export.processing_delay, Duration::ZERO);
        assert!(!settings.export.keep_artifacts);
        assert_eq!(
            settings.cache.showtime_capacity,
            DEFAULT_SHOWTIME_CACHE_CAPACITY
        );
    }

    #[test]
    fn cli_overrides_take_highest_precedence() {
        let mut raw = RawSettings::default();
        raw.export.workers = Some(2);
        raw.logging.level = Some("info".to_string());

        raw.apply_logging_overrides(&LoggingOverrides {
            log_level: Some("debug".to_string()),
            log_format: Some("json".to_string()),
        });
        raw.apply_export_overrides(&ExportOverrides {
            workers: Some(8),
            processing_delay_ms: Some(250),
            keep_artifacts: Some(true),
            ..Default::default()
        });
        let settings = Settings::from_raw(raw).expect("valid settings");

        assert_eq!(settings.logging.level, LevelFilter::DEBUG);
        assert_eq!(settings.logging.format, LogFormat::Json);
        assert_eq!(settings.export.workers.get(), 8);
        assert_eq!(settings.export.processing_delay, Duration::from_millis(250));
        assert!(settings.export.keep_artifacts);
    }

    #[test]
    fn zero_workers_are_rejected() {
        let mut raw = RawSettings::default();
        raw.export.workers = Some(0);

        let err = Settings::from_raw(raw).unwrap_err();
        assert!(matches!(
            err,
            LoadError::Invalid {
                key: "export.workers",
                ..
            }
        ));
    }

    #[test]
    fn zero_cache_capacity_is_rejected() {
        let mut raw = RawSettings::default();
        raw.apply_showtimes_overrides(&ShowtimesArgs {
            cache_capacity: Some(0),
            lookups: Vec::new(),
        });

        let err = Settings::from_raw(raw).unwrap_err();
        assert!(matches!(
            err,
            LoadError::Invalid {
                key: "cache.showtime_capacity",
                ..
            }
        ));
    }

    #[test]
    fn unknown_log_format_is_rejected() {
        let mut raw = RawSettings::default();
        raw.logging.format = Some("xml".to_string());

        let err = Settings::from_raw(raw).unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid configuration for `logging.format`: expected `pretty` or `json`, got `xml`"
        );
    }

    #[test]
    fn sweep_overrides_retention_and_dir() {
        let mut raw = RawSettings::default();
        raw.apply_sweep_overrides(&SweepArgs {
            artifact_dir: Some("/var/tmp/cinema".to_string()),
            artifact_retention_secs: Some(30),
            all: false,
        });
        let settings = Settings::from_raw(raw).expect("valid settings");

        assert_eq!(settings.export.artifact_dir, PathBuf::from("/var/tmp/cinema"));
        assert_eq!(
            settings.maintenance.artifact_retention,
            Duration::from_secs(30)
        );
        assert_eq!(
            settings.maintenance.job_retention,
            MaintenanceConfig::default().job_retention
        );
    }

    #[test]
    fn blank_paths_fall_back_to_defaults() {
        let mut raw = RawSettings::default();
        raw.export.source = Some("   ".to_string());

        let settings = Settings::from_raw(raw).expect("valid settings");
        assert_eq!(settings.export.source, PathBuf::from(DEFAULT_SOURCE));
    }
}
