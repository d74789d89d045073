use crate::error::PipelineError;
use model::partition::PartitionMetadata;
use store::{client::PartitionedStoreClient, session::SessionHandle};
use tracing::info;

/// Fetches the target table's partition layout, once per job. No retry
/// happens here; retry policy belongs to the caller resubmitting the job.
pub async fn resolve(
    client: &dyn PartitionedStoreClient,
    session: &SessionHandle,
    table: &str,
) -> Result<PartitionMetadata, PipelineError> {
    let metadata = client
        .table_layout(session, table)
        .await
        .map_err(PipelineError::Metadata)?;

    info!(
        table,
        partitions = metadata.partition_count(),
        families = ?metadata.column_families(),
        "resolved partition metadata"
    );
    Ok(metadata)
}
