use model::partition::PartitionError;
use thiserror::Error;

/// Errors raised by store bindings: sessions, filesystem staging, bulk
/// copies and the partitioned store client.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Session establishment against an environment failed.
    #[error("session error: {0}")]
    Session(String),

    /// The table's partition layout could not be fetched.
    #[error("table layout error: {0}")]
    TableLayout(String),

    /// Partition boundaries returned by the store were unusable.
    #[error("partition metadata error: {0}")]
    Partition(#[from] PartitionError),

    /// The store rejected or failed the shard load.
    #[error("shard load error: {0}")]
    Load(String),

    /// A bulk copy operation failed.
    #[error("copy error: {0}")]
    Copy(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}
