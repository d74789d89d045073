use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fmt, str::FromStr};
use thiserror::Error;

/// Default upper bound for a single shard file (5x the store's default
/// maximum file size of 10 GiB).
pub const DEFAULT_SHARD_MAX_SIZE: u64 = 5 * 10 * 1024 * 1024 * 1024;

#[derive(Debug, Error)]
#[error("unknown {kind}: {input}")]
pub struct ModeParseError {
    pub kind: &'static str,
    pub input: String,
}

/// How shard files are materialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WriteMode {
    BulkLoad,
    ThinBulkLoad,
}

impl FromStr for WriteMode {
    type Err = ModeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bulkLoad" => Ok(WriteMode::BulkLoad),
            "thinBulkLoad" => Ok(WriteMode::ThinBulkLoad),
            other => Err(ModeParseError {
                kind: "writeMode",
                input: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for WriteMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriteMode::BulkLoad => write!(f, "bulkLoad"),
            WriteMode::ThinBulkLoad => write!(f, "thinBulkLoad"),
        }
    }
}

/// How source columns map onto target cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MappingMode {
    OneToOne,
    ArrayMerge,
}

impl FromStr for MappingMode {
    type Err = ModeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "one2one" => Ok(MappingMode::OneToOne),
            "arrayMerge" => Ok(MappingMode::ArrayMerge),
            other => Err(ModeParseError {
                kind: "mappingMode",
                input: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for MappingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MappingMode::OneToOne => write!(f, "one2one"),
            MappingMode::ArrayMerge => write!(f, "arrayMerge"),
        }
    }
}

/// Named target environment: a property bag the session factory and store
/// bindings interpret (endpoints, credentials, filesystem roots).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Environment {
    pub name: String,
    pub properties: HashMap<String, String>,
}

impl Environment {
    pub fn named(name: &str) -> Self {
        Environment {
            name: name.to_string(),
            properties: HashMap::new(),
        }
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }
}

/// Replication settings; present only when the job replicates to a second
/// environment after the local commit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReplicationSpec {
    pub dest_env: Environment,
    /// Maximum number of concurrent copy tasks.
    pub max_tasks: usize,
    /// Per-task bandwidth cap in MB/s.
    pub bandwidth_mb: u64,
    /// Remote staging base; when absent the local relative path is reused.
    pub remote_base: Option<String>,
}

/// Fully validated description of one bulk-ingest run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JobSpec {
    pub job_id: String,
    pub table: String,
    pub staging_base_dir: String,
    pub write_mode: WriteMode,
    pub mapping_mode: MappingMode,
    pub merge_qualifier: String,
    pub shard_max_size: u64,
    /// Cell timestamp; when absent the run uses current epoch millis.
    pub shard_timestamp: Option<i64>,
    pub compaction_exclude: bool,
    pub source_env: Environment,
    pub replication: Option<ReplicationSpec>,
}

impl JobSpec {
    pub fn replicates(&self) -> bool {
        self.replication.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_mode_parses_known_literals() {
        assert_eq!("bulkLoad".parse::<WriteMode>().unwrap(), WriteMode::BulkLoad);
        assert_eq!(
            "thinBulkLoad".parse::<WriteMode>().unwrap(),
            WriteMode::ThinBulkLoad
        );
        assert!("bulkload".parse::<WriteMode>().is_err());
    }

    #[test]
    fn mapping_mode_parses_known_literals() {
        assert_eq!(
            "one2one".parse::<MappingMode>().unwrap(),
            MappingMode::OneToOne
        );
        assert_eq!(
            "arrayMerge".parse::<MappingMode>().unwrap(),
            MappingMode::ArrayMerge
        );
        assert!("bogus".parse::<MappingMode>().is_err());
    }
}
