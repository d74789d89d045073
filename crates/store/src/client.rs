use crate::{error::StoreError, session::SessionHandle};
use async_trait::async_trait;
use model::partition::PartitionMetadata;
use std::path::Path;

/// Capability interface over the target partitioned store: fetch the
/// table's partition layout and commit shard files into its partitions.
/// Any backing store can be substituted behind this contract.
#[async_trait]
pub trait PartitionedStoreClient: Send + Sync {
    /// Current partition boundaries and column families of `table`.
    async fn table_layout(
        &self,
        session: &SessionHandle,
        table: &str,
    ) -> Result<PartitionMetadata, StoreError>;

    /// Loads the committed shard tree at `committed` into `table`'s
    /// partitions.
    async fn load_shards(
        &self,
        session: &SessionHandle,
        table: &str,
        committed: &Path,
    ) -> Result<(), StoreError>;
}
