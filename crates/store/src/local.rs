use crate::{
    client::PartitionedStoreClient,
    error::StoreError,
    fs::walk_files,
    session::SessionHandle,
};
use async_trait::async_trait;
use model::partition::PartitionMetadata;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

/// On-disk table descriptor consumed by [`LocalStoreClient`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableDescriptor {
    /// Ordered partition start keys; the first is conventionally empty.
    pub start_keys: Vec<String>,
    pub column_families: Vec<String>,
}

/// File-backed store binding used by the CLI and tests: each table is a
/// directory under the store root holding a `layout.json` descriptor, and
/// loaded shard trees land under `loaded/`.
#[derive(Debug, Clone)]
pub struct LocalStoreClient {
    root: PathBuf,
}

impl LocalStoreClient {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        LocalStoreClient { root: root.into() }
    }

    fn table_dir(&self, table: &str) -> PathBuf {
        self.root.join(table)
    }
}

#[async_trait]
impl PartitionedStoreClient for LocalStoreClient {
    async fn table_layout(
        &self,
        session: &SessionHandle,
        table: &str,
    ) -> Result<PartitionMetadata, StoreError> {
        let path = self.table_dir(table).join("layout.json");
        let raw = tokio::fs::read(&path).await.map_err(|err| {
            StoreError::TableLayout(format!(
                "no layout for table '{table}' in environment '{}': {err}",
                session.environment
            ))
        })?;
        let descriptor: TableDescriptor = serde_json::from_slice(&raw)?;

        let start_keys = descriptor
            .start_keys
            .into_iter()
            .map(String::into_bytes)
            .collect();
        Ok(PartitionMetadata::new(
            start_keys,
            descriptor.column_families,
        )?)
    }

    async fn load_shards(
        &self,
        session: &SessionHandle,
        table: &str,
        committed: &Path,
    ) -> Result<(), StoreError> {
        if !tokio::fs::try_exists(committed).await? {
            return Err(StoreError::Load(format!(
                "committed path {} does not exist",
                committed.display()
            )));
        }

        let target = self.table_dir(table).join("loaded");
        for file in walk_files(committed).await? {
            let relative = file
                .path
                .strip_prefix(committed)
                .map_err(|err| StoreError::Load(err.to_string()))?;
            let dest = target.join(relative);
            if let Some(parent) = dest.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::copy(&file.path, &dest).await?;
        }

        info!(
            table,
            environment = %session.environment,
            path = %committed.display(),
            "shards loaded into local store"
        );
        Ok(())
    }
}
