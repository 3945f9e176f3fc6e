// Worker constants (No magic values)
use std::time::Duration;

/// Worker count used when the platform cannot report its parallelism
pub const FALLBACK_WORKER_COUNT: usize = 4;

/// How long `JobRunner::shutdown` waits for queued jobs to drain (5 seconds)
pub const SHUTDOWN_GRACE_PERIOD: Duration = Duration::from_secs(5);

/// Interval between status polls when a caller waits for a job (100ms)
pub const STATUS_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Failure message recorded for jobs submitted after the runner stopped
pub const RUNNER_STOPPED_MESSAGE: &str = "job runner is shut down";
