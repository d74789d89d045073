//! Keys of the flat string-keyed job configuration.

pub const TABLE: &str = "table";
pub const STAGING_BASE_DIR: &str = "stagingBaseDir";
pub const WRITE_MODE: &str = "writeMode";
pub const MAPPING_MODE: &str = "mappingMode";
pub const DO_REPLICATE: &str = "doReplicate";
pub const SHARD_MAX_SIZE: &str = "shardMaxSize";
pub const SHARD_TIMESTAMP: &str = "shardTimestamp";
pub const MERGE_QUALIFIER: &str = "mergeQualifier";
pub const COMPACTION_EXCLUDE: &str = "compactionExclude";
pub const COPY_MAX_TASKS: &str = "copyMaxTasks";
pub const COPY_BANDWIDTH: &str = "copyBandwidth";
pub const REMOTE_STAGING_BASE_DIR: &str = "remoteStagingBaseDir";
pub const SOURCE_ENV: &str = "sourceEnv";
pub const DEST_ENV: &str = "destEnv";

/// Environment names used when the config does not override them.
pub const DEFAULT_SOURCE_ENV: &str = "source";
pub const DEFAULT_DEST_ENV: &str = "dest";
