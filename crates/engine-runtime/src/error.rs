use engine_config::error::ConfigError;
use std::fmt;
use store::error::StoreError;
use thiserror::Error;

/// Pipeline stages, in execution order. Used to tag fatal errors with the
/// point of failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Validate,
    Authenticate,
    Metadata,
    Prepare,
    ShardWrite,
    Commit,
    Replication,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Validate => "validate",
            Stage::Authenticate => "authenticate",
            Stage::Metadata => "metadata",
            Stage::Prepare => "prepare",
            Stage::ShardWrite => "shard-write",
            Stage::Commit => "commit",
            Stage::Replication => "replication",
        };
        write!(f, "{name}")
    }
}

/// Fatal errors of the bulk-ingest pipeline. Statistics failures are not
/// represented here: they are caught and logged at their origin and never
/// fail the job.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Bad or missing parameters, detected before any I/O.
    #[error("configuration rejected: {0}")]
    Config(#[from] ConfigError),

    /// Session establishment against an environment failed.
    #[error("authentication failed: {0}")]
    Auth(#[source] StoreError),

    /// Partition information for the target table is unavailable.
    #[error("partition metadata unavailable: {0}")]
    Metadata(#[source] StoreError),

    /// Clearing a stale staging path failed before writing began.
    #[error("staging pre-clear failed: {0}")]
    Staging(#[source] StoreError),

    /// One or more partitions failed to produce a shard file.
    #[error("shard build failed: {0}")]
    ShardBuild(String),

    /// The staging-to-committed rename failed.
    #[error("commit rename failed: {0}")]
    Commit(#[source] StoreError),

    /// Copy, marker or remote load failed. The local commit is not rolled
    /// back.
    #[error("replication failed: {0}")]
    Replication(String),

    /// A partition task was cancelled or panicked.
    #[error("task join error: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),

    /// Cooperative cancellation fired between stages.
    #[error("job cancelled")]
    Cancelled,
}

/// The single terminal error surfaced to the caller: job identity, the
/// stage that failed, and the root cause.
#[derive(Debug, Error)]
#[error("job {job_id} failed at stage {stage}: {source}")]
pub struct JobError {
    pub job_id: String,
    pub stage: Stage,
    #[source]
    pub source: PipelineError,
}

impl JobError {
    pub fn at(job_id: &str, stage: Stage, source: PipelineError) -> Self {
        JobError {
            job_id: job_id.to_string(),
            stage,
            source,
        }
    }
}
