use crate::{error::ConfigError, options};
use model::{
    job::{Environment, JobSpec, MappingMode, ReplicationSpec, WriteMode, DEFAULT_SHARD_MAX_SIZE},
    mapping::DEFAULT_MERGE_QUALIFIER,
};
use std::collections::HashMap;
use tracing::debug;

/// Validates the flat option map of one job submission and resolves it into
/// a typed [`JobSpec`]. Validation is pure: it performs no filesystem or
/// store calls, so an invalid config has no side effects.
pub struct JobValidator<'a> {
    job_id: &'a str,
    options: &'a HashMap<String, String>,
}

impl<'a> JobValidator<'a> {
    pub fn new(job_id: &'a str, options: &'a HashMap<String, String>) -> Self {
        Self { job_id, options }
    }

    pub fn validate(&self) -> Result<JobSpec, ConfigError> {
        debug!(job_id = self.job_id, options = ?self.options, "validating job options");

        if self.job_id.trim().is_empty() {
            return Err(ConfigError::MissingJobId);
        }

        let table = self.required_non_blank(options::TABLE, ConfigError::MissingTable)?;
        let staging_base_dir =
            self.required_non_blank(options::STAGING_BASE_DIR, ConfigError::MissingStagingDir)?;

        let write_mode = self.write_mode()?;
        let mapping_mode = self.mapping_mode()?;
        let do_replicate = self.replicate_flag()?;
        let shard_max_size = self.shard_max_size()?;
        let shard_timestamp = self.shard_timestamp()?;
        let replication = if do_replicate {
            Some(self.replication_spec()?)
        } else {
            None
        };

        let merge_qualifier = self
            .get(options::MERGE_QUALIFIER)
            .unwrap_or(DEFAULT_MERGE_QUALIFIER)
            .to_string();
        let compaction_exclude = self
            .get(options::COMPACTION_EXCLUDE)
            .map(|v| v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);
        let source_env = Environment::named(
            self.get(options::SOURCE_ENV)
                .unwrap_or(options::DEFAULT_SOURCE_ENV),
        );

        Ok(JobSpec {
            job_id: self.job_id.to_string(),
            table,
            staging_base_dir,
            write_mode,
            mapping_mode,
            merge_qualifier,
            shard_max_size,
            shard_timestamp,
            compaction_exclude,
            source_env,
            replication,
        })
    }

    fn get(&self, key: &str) -> Option<&'a str> {
        self.options.get(key).map(String::as_str)
    }

    fn required_non_blank(
        &self,
        key: &str,
        missing: ConfigError,
    ) -> Result<String, ConfigError> {
        match self.get(key) {
            Some(value) if !value.trim().is_empty() => Ok(value.to_string()),
            _ => Err(missing),
        }
    }

    fn write_mode(&self) -> Result<WriteMode, ConfigError> {
        let raw = self.get(options::WRITE_MODE).unwrap_or_default();
        raw.parse()
            .map_err(|_| ConfigError::InvalidWriteMode(raw.to_string()))
    }

    fn mapping_mode(&self) -> Result<MappingMode, ConfigError> {
        let raw = self.get(options::MAPPING_MODE).unwrap_or_default();
        raw.parse()
            .map_err(|_| ConfigError::InvalidMappingMode(raw.to_string()))
    }

    fn replicate_flag(&self) -> Result<bool, ConfigError> {
        let raw = self.get(options::DO_REPLICATE).unwrap_or_default();
        match raw {
            "true" => Ok(true),
            "false" => Ok(false),
            other => Err(ConfigError::InvalidReplicateFlag(other.to_string())),
        }
    }

    fn shard_max_size(&self) -> Result<u64, ConfigError> {
        match self.get(options::SHARD_MAX_SIZE) {
            None => Ok(DEFAULT_SHARD_MAX_SIZE),
            Some(raw) => match raw.parse::<u64>() {
                Ok(size) if size > 0 => Ok(size),
                _ => Err(ConfigError::InvalidShardMaxSize(raw.to_string())),
            },
        }
    }

    fn shard_timestamp(&self) -> Result<Option<i64>, ConfigError> {
        match self.get(options::SHARD_TIMESTAMP) {
            None => Ok(None),
            Some(raw) => raw
                .parse::<i64>()
                .map(Some)
                .map_err(|_| ConfigError::InvalidShardTimestamp(raw.to_string())),
        }
    }

    /// Copy bounds are mandatory and positive once replication is enabled.
    fn replication_spec(&self) -> Result<ReplicationSpec, ConfigError> {
        let max_tasks = self.positive_copy_param(options::COPY_MAX_TASKS)? as usize;
        let bandwidth_mb = self.positive_copy_param(options::COPY_BANDWIDTH)?;
        let remote_base = self
            .get(options::REMOTE_STAGING_BASE_DIR)
            .filter(|v| !v.trim().is_empty())
            .map(str::to_string);
        let dest_env = Environment::named(
            self.get(options::DEST_ENV).unwrap_or(options::DEFAULT_DEST_ENV),
        );

        Ok(ReplicationSpec {
            dest_env,
            max_tasks,
            bandwidth_mb,
            remote_base,
        })
    }

    fn positive_copy_param(&self, key: &str) -> Result<u64, ConfigError> {
        let raw = self
            .get(key)
            .ok_or_else(|| ConfigError::InvalidCopySettings(format!("{key} not configured")))?;
        match raw.parse::<u64>() {
            Ok(value) if value > 0 => Ok(value),
            _ => Err(ConfigError::InvalidCopySettings(format!(
                "{key}={raw} is not a positive integer"
            ))),
        }
    }
}
