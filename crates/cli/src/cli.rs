//! Command-line arguments for the `cinema-jobs` binary.

use std::path::PathBuf;

use clap::{builder::BoolishValueParser, Args, Parser, Subcommand, ValueHint};

#[derive(Debug, Parser)]
#[command(name = "cinema-jobs")]
#[command(about = "Cinema log export jobs", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Optional path to a configuration file.
    #[arg(long = "config", env = "CINEMA_CONFIG_FILE", value_name = "PATH", global = true)]
    pub config_file: Option<PathBuf>,

    #[command(flatten)]
    pub logging: LoggingOverrides,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Export the log lines of one or more dates into artifact files
    Export(ExportArgs),

    /// Run one maintenance pass over the artifact directory
    Sweep(SweepArgs),

    /// Exercise the showtime read-through cache with sample data
    Showtimes(ShowtimesArgs),
}

#[derive(Debug, Args, Default, Clone)]
pub struct LoggingOverrides {
    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Override the log output format (pretty|json).
    #[arg(long = "log-format", value_name = "FORMAT", global = true)]
    pub log_format: Option<String>,
}

#[derive(Debug, Args, Clone)]
pub struct ExportArgs {
    /// Dates to export, formatted dd-MM-yyyy
    #[arg(value_name = "DATE", required = true)]
    pub dates: Vec<String>,

    /// Directory the finished artifacts are downloaded into
    #[arg(long, value_name = "DIR", default_value = ".", value_hint = ValueHint::DirPath)]
    pub out: PathBuf,

    #[command(flatten)]
    pub overrides: ExportOverrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ExportOverrides {
    /// Override the log file exports read from.
    #[arg(long = "source", value_name = "PATH", value_hint = ValueHint::FilePath)]
    pub source: Option<String>,

    /// Override the directory artifacts are written to.
    #[arg(long = "artifact-dir", value_name = "PATH", value_hint = ValueHint::DirPath)]
    pub artifact_dir: Option<String>,

    /// Override the worker count.
    #[arg(long = "workers", value_name = "COUNT")]
    pub workers: Option<u64>,

    /// Override the artificial per-export delay.
    #[arg(long = "processing-delay-ms", value_name = "MILLIS")]
    pub processing_delay_ms: Option<u64>,

    /// Keep artifact files on exit instead of purging them.
    #[arg(
        long = "keep-artifacts",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub keep_artifacts: Option<bool>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct SweepArgs {
    /// Override the directory to sweep.
    #[arg(long = "artifact-dir", value_name = "PATH", value_hint = ValueHint::DirPath)]
    pub artifact_dir: Option<String>,

    /// Override the artifact retention.
    #[arg(long = "artifact-retention-secs", value_name = "SECONDS")]
    pub artifact_retention_secs: Option<u64>,

    /// Delete every artifact regardless of age.
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub all: bool,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ShowtimesArgs {
    /// Override the number of showtimes the cache holds.
    #[arg(long = "cache-capacity", value_name = "COUNT")]
    pub cache_capacity: Option<u64>,

    /// Showtime ids to look up, in order (repeat ids to raise their frequency)
    #[arg(long = "lookup", value_name = "ID", value_delimiter = ',')]
    pub lookups: Vec<u64>,
}
