//! Contract between the pipeline and the data-parallel engine executing one
//! task per partition. Results are collected all-or-nothing: the first
//! failing task aborts the whole batch.

use crate::error::PipelineError;
use async_trait::async_trait;
use futures::stream::{FuturesUnordered, StreamExt};
use std::{future::Future, pin::Pin};
use tokio::task::{AbortHandle, JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// One unit of per-partition work.
pub type PartitionTask = Pin<Box<dyn Future<Output = Result<(), PipelineError>> + Send + 'static>>;

/// Runs a batch of independent partition tasks to completion.
#[async_trait]
pub trait PartitionEngine: Send + Sync {
    /// Executes every task. Returns `Ok` only when all tasks succeeded;
    /// any task failure or a fired cancellation token aborts the rest.
    async fn run_all(
        &self,
        tasks: Vec<PartitionTask>,
        cancel: &CancellationToken,
    ) -> Result<(), PipelineError>;
}

/// Local binding over the tokio scheduler: each partition task becomes one
/// spawned task, joined all-or-nothing.
#[derive(Debug, Default, Clone)]
pub struct TokioPartitionEngine;

#[async_trait]
impl PartitionEngine for TokioPartitionEngine {
    async fn run_all(
        &self,
        tasks: Vec<PartitionTask>,
        cancel: &CancellationToken,
    ) -> Result<(), PipelineError> {
        let handles: Vec<JoinHandle<Result<(), PipelineError>>> =
            tasks.into_iter().map(tokio::spawn).collect();
        let aborts: Vec<AbortHandle> = handles.iter().map(|h| h.abort_handle()).collect();
        let mut running: FuturesUnordered<JoinHandle<Result<(), PipelineError>>> =
            handles.into_iter().collect();

        let result = loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    warn!("cancellation requested, aborting partition tasks");
                    break Err(PipelineError::Cancelled);
                }
                next = running.next() => match next {
                    None => break Ok(()),
                    Some(Ok(Ok(()))) => continue,
                    Some(Ok(Err(err))) => break Err(err),
                    Some(Err(join_err)) => break Err(PipelineError::TaskJoin(join_err)),
                }
            }
        };

        if result.is_err() {
            for abort in aborts {
                abort.abort();
            }
        }
        result
    }
}
