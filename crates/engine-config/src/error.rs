use thiserror::Error;

/// Errors raised while turning the flat option map into a validated job.
/// All are detected before any I/O and are always fatal.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing job id")]
    MissingJobId,

    #[error("missing table")]
    MissingTable,

    #[error("missing staging dir")]
    MissingStagingDir,

    #[error("invalid writeMode: {0} (expected bulkLoad or thinBulkLoad)")]
    InvalidWriteMode(String),

    #[error("invalid mappingMode: {0} (expected one2one or arrayMerge)")]
    InvalidMappingMode(String),

    #[error("invalid doReplicate: {0} (expected true or false)")]
    InvalidReplicateFlag(String),

    #[error("invalid shardMaxSize: {0}")]
    InvalidShardMaxSize(String),

    #[error("invalid shardTimestamp: {0}")]
    InvalidShardTimestamp(String),

    #[error("missing/invalid copy params: {0}")]
    InvalidCopySettings(String),
}
