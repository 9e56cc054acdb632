//! Default values and tunables shared across querylane crates.

/// Number of log lines retained per entity id for replay to late subscribers.
pub const LOG_RETENTION: usize = 500;

/// Default polling interval for the job worker (milliseconds).
pub const JOB_POLL_INTERVAL_MS: u64 = 500;

/// Default maximum number of jobs executed concurrently by one worker.
pub const JOB_MAX_CONCURRENT: usize = 4;

/// Wall-clock timeout for a single job execution (seconds).
///
/// A job that exceeds this is marked failed rather than left in `running`
/// forever; see the worker for the enforcement point.
pub const JOB_TIMEOUT_SECS: u64 = 600;

/// Capacity of the worker's broadcast event channel.
pub const WORKER_EVENT_CAPACITY: usize = 256;

/// Prefix for locally synthesized job ids, returned when the job queue is
/// unreachable. Operators can tell these apart from real queue ids at a glance.
pub const LOCAL_JOB_ID_PREFIX: &str = "local-";

/// Namespace under the artifact root where schema artifacts are written.
pub const SCHEMA_ARTIFACT_DIR: &str = "schemas";
