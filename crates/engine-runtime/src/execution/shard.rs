use crate::{
    engine::{PartitionEngine, PartitionTask},
    error::PipelineError,
};
use async_trait::async_trait;
use model::{
    core::{cell::ShardCell, row::Row},
    mapping::CellMapper,
    partition::PartitionMetadata,
};
use std::{
    path::{Path, PathBuf},
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};
use store::error::StoreError;
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Tuning parameters forwarded to the shard encoder. `timestamp` is stamped
/// onto full cells; `max_size` and `compaction_exclude` ride through to the
/// encoder uninterpreted by the pipeline.
#[derive(Debug, Clone, Copy)]
pub struct ShardWriteParams {
    pub max_size: u64,
    pub timestamp: i64,
    pub compaction_exclude: bool,
}

/// Encodes one partition's sorted cells into an immutable shard file.
#[async_trait]
pub trait ShardEncoder: Send + Sync {
    /// Writes `cells` to `path`, returning the encoded length in bytes.
    async fn write_shard(
        &self,
        path: &Path,
        cells: &[ShardCell],
        params: &ShardWriteParams,
    ) -> Result<u64, StoreError>;
}

/// Default encoder: one JSON document per cell, newline separated. The
/// `compaction_exclude` flag has no meaning for this binding; store-native
/// encoders honor it.
#[derive(Debug, Default, Clone)]
pub struct JsonShardEncoder;

#[async_trait]
impl ShardEncoder for JsonShardEncoder {
    async fn write_shard(
        &self,
        path: &Path,
        cells: &[ShardCell],
        params: &ShardWriteParams,
    ) -> Result<u64, StoreError> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut buf = Vec::new();
        for cell in cells {
            serde_json::to_writer(&mut buf, cell)?;
            buf.push(b'\n');
        }

        let len = buf.len() as u64;
        if len > params.max_size {
            warn!(
                path = %path.display(),
                len,
                max_size = params.max_size,
                "shard exceeds configured max size"
            );
        }

        let mut file = tokio::fs::File::create(path).await?;
        file.write_all(&buf).await?;
        file.flush().await?;
        Ok(len)
    }
}

/// Totals accumulated across all partition tasks of one write stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShardWriteSummary {
    pub shards: usize,
    pub cells: u64,
    pub bytes: u64,
}

/// Produces one sorted shard file per partition under the uncommitted
/// staging path, fanning partitions out through the partition engine.
pub struct ShardWriter {
    engine: Arc<dyn PartitionEngine>,
    encoder: Arc<dyn ShardEncoder>,
}

impl ShardWriter {
    pub fn new(engine: Arc<dyn PartitionEngine>, encoder: Arc<dyn ShardEncoder>) -> Self {
        ShardWriter { engine, encoder }
    }

    /// Writes every partition's shard or fails the whole batch: a single
    /// partition error aborts the job with no partial commit.
    pub async fn write_all(
        &self,
        job_id: &str,
        rows: Arc<Vec<Row>>,
        metadata: Arc<PartitionMetadata>,
        mapper: Arc<CellMapper>,
        staging: &Path,
        params: ShardWriteParams,
        cancel: &CancellationToken,
    ) -> Result<ShardWriteSummary, PipelineError> {
        let partition_count = metadata.partition_count();
        debug!(job_id, partitions = partition_count, "starting shard write");

        let cells_total = Arc::new(AtomicU64::new(0));
        let bytes_total = Arc::new(AtomicU64::new(0));

        let mut tasks: Vec<PartitionTask> = Vec::with_capacity(partition_count);
        for partition in 0..partition_count {
            let rows = rows.clone();
            let metadata = metadata.clone();
            let mapper = mapper.clone();
            let encoder = self.encoder.clone();
            let path = shard_path(staging, metadata.primary_family(), partition);
            let cells_total = cells_total.clone();
            let bytes_total = bytes_total.clone();

            tasks.push(Box::pin(async move {
                let cells = build_partition_cells(&rows, &metadata, &mapper, partition, &params)?;
                let bytes = encoder
                    .write_shard(&path, &cells, &params)
                    .await
                    .map_err(|err| {
                        PipelineError::ShardBuild(format!(
                            "partition {partition} encode failed: {err}"
                        ))
                    })?;

                cells_total.fetch_add(cells.len() as u64, Ordering::Relaxed);
                bytes_total.fetch_add(bytes, Ordering::Relaxed);
                Ok(())
            }));
        }

        self.engine.run_all(tasks, cancel).await?;

        let summary = ShardWriteSummary {
            shards: partition_count,
            cells: cells_total.load(Ordering::Relaxed),
            bytes: bytes_total.load(Ordering::Relaxed),
        };
        info!(
            job_id,
            shards = summary.shards,
            cells = summary.cells,
            bytes = summary.bytes,
            "shard write finished"
        );
        Ok(summary)
    }
}

/// Maps and sorts the cells belonging to `partition`.
fn build_partition_cells(
    rows: &[Row],
    metadata: &PartitionMetadata,
    mapper: &CellMapper,
    partition: usize,
    params: &ShardWriteParams,
) -> Result<Vec<ShardCell>, PipelineError> {
    let mut cells = Vec::new();
    for row in rows {
        if metadata.partition_for_key(&row.key) != partition {
            continue;
        }
        let mapped = mapper.map_row(row, params.timestamp).map_err(|err| {
            PipelineError::ShardBuild(format!("partition {partition} mapping failed: {err}"))
        })?;
        cells.extend(mapped);
    }
    cells.sort();
    Ok(cells)
}

/// `<staging>/<family>/part-NNNNN.shard`
pub fn shard_path(staging: &Path, family: &str, partition: usize) -> PathBuf {
    staging.join(family).join(format!("part-{partition:05}.shard"))
}
