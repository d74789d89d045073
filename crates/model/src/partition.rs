use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PartitionError {
    #[error("table has no partition boundaries")]
    Empty,

    #[error("partition start keys are not strictly ascending")]
    Unordered,
}

/// Partition boundaries and column families of the target table, fetched
/// once per job and immutable afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PartitionMetadata {
    start_keys: Vec<Vec<u8>>,
    column_families: Vec<String>,
}

impl PartitionMetadata {
    /// Builds metadata from ordered partition start keys. The first key is
    /// conventionally empty (the leftmost partition is open at the start).
    pub fn new(
        start_keys: Vec<Vec<u8>>,
        column_families: Vec<String>,
    ) -> Result<Self, PartitionError> {
        if start_keys.is_empty() {
            return Err(PartitionError::Empty);
        }
        if start_keys.windows(2).any(|w| w[0] >= w[1]) {
            return Err(PartitionError::Unordered);
        }
        Ok(PartitionMetadata {
            start_keys,
            column_families,
        })
    }

    pub fn partition_count(&self) -> usize {
        self.start_keys.len()
    }

    pub fn start_keys(&self) -> &[Vec<u8>] {
        &self.start_keys
    }

    pub fn column_families(&self) -> &[String] {
        &self.column_families
    }

    /// The primary column family cells are mapped into.
    pub fn primary_family(&self) -> &str {
        self.column_families
            .first()
            .map(String::as_str)
            .unwrap_or("cf")
    }

    /// Index of the partition owning `key`: the last partition whose start
    /// key is <= `key`. Keys below the first boundary fall into partition 0.
    pub fn partition_for_key(&self, key: &[u8]) -> usize {
        let upper = self.start_keys.partition_point(|start| start.as_slice() <= key);
        upper.saturating_sub(1)
    }

    /// Key range `[start, end)` of partition `idx`; the last partition is
    /// open-ended.
    pub fn range(&self, idx: usize) -> (&[u8], Option<&[u8]>) {
        let start = self.start_keys[idx].as_slice();
        let end = self.start_keys.get(idx + 1).map(Vec::as_slice);
        (start, end)
    }
}
