use crate::error::PipelineError;
use model::{
    job::{JobSpec, ReplicationSpec},
    staging::StagingLocation,
};
use std::{path::PathBuf, sync::Arc};
use store::{
    client::PartitionedStoreClient,
    copier::{BulkCopier, CopyLimits},
    fs::StagingStore,
    session::SessionFactory,
};
use tracing::{info, warn};

/// Zero-byte marker written at the remote root once the copy completed.
/// External pollers treat its presence as "copy done" and its absence as
/// "not yet", never as failure.
pub const COPY_MARKER: &str = "distcp.succ";

/// Destination-environment collaborators, present only when the job
/// replicates.
pub struct ReplicationBindings {
    pub client: Arc<dyn PartitionedStoreClient>,
    pub fs: Arc<dyn StagingStore>,
    pub copier: Arc<dyn BulkCopier>,
}

/// Copies the committed shard tree to the destination environment, marks
/// copy completion, triggers the remote load and reclaims the local copy.
pub struct ReplicationCoordinator<'a> {
    sessions: &'a dyn SessionFactory,
    bindings: &'a ReplicationBindings,
    source_fs: &'a dyn StagingStore,
}

impl<'a> ReplicationCoordinator<'a> {
    pub fn new(
        sessions: &'a dyn SessionFactory,
        bindings: &'a ReplicationBindings,
        source_fs: &'a dyn StagingStore,
    ) -> Self {
        ReplicationCoordinator {
            sessions,
            bindings,
            source_fs,
        }
    }

    /// Runs the replication state machine. Returns the remote path the
    /// shards were loaded from. Failures before the remote load are fatal;
    /// a failed local delete afterwards is logged and the job still
    /// succeeds.
    pub async fn run(
        &self,
        job: &JobSpec,
        spec: &ReplicationSpec,
        local: &StagingLocation,
    ) -> Result<PathBuf, PipelineError> {
        let session = self
            .sessions
            .establish_session(&spec.dest_env)
            .await
            .map_err(PipelineError::Auth)?;
        info!(
            job_id = job.job_id,
            environment = spec.dest_env.name,
            "destination session established"
        );

        // Without an explicit remote base both environments address the
        // committed tree through the same path: the load happens in place
        // and the tree must survive the run.
        let remote = remote_path(job, spec, local);
        let in_place = remote == local.committed();
        if in_place {
            info!(
                job_id = job.job_id,
                path = %remote.display(),
                "remote path matches the committed tree, loading in place"
            );
        } else {
            let limits = CopyLimits {
                max_tasks: spec.max_tasks,
                bandwidth_mb: spec.bandwidth_mb,
            };
            let summary = self
                .bindings
                .copier
                .copy_tree(local.committed(), &remote, &limits)
                .await
                .map_err(|err| PipelineError::Replication(format!("copy failed: {err}")))?;
            info!(
                job_id = job.job_id,
                files = summary.files,
                bytes = summary.bytes,
                remote = %remote.display(),
                "committed shard tree copied"
            );
        }

        self.bindings
            .fs
            .create_marker(&remote, COPY_MARKER)
            .await
            .map_err(|err| PipelineError::Replication(format!("marker write failed: {err}")))?;

        self.bindings
            .client
            .load_shards(&session, &job.table, &remote)
            .await
            .map_err(|err| PipelineError::Replication(format!("remote load failed: {err}")))?;
        info!(job_id = job.job_id, table = job.table, "remote load finished");

        // Space reclamation only; the remote load already succeeded. An
        // in-place load has nothing to reclaim.
        if !in_place {
            if let Err(err) = self.source_fs.remove_tree(local.committed()).await {
                warn!(
                    job_id = job.job_id,
                    path = %local.committed().display(),
                    error = %err,
                    "failed to delete local committed directory after replication"
                );
            }
        }

        Ok(remote)
    }
}

/// Remote staging path: a fresh date/job-id path under the configured
/// remote base, or the same relative path as locally when none is set.
fn remote_path(job: &JobSpec, spec: &ReplicationSpec, local: &StagingLocation) -> PathBuf {
    match &spec.remote_base {
        Some(base) => StagingLocation::for_today(base, &job.job_id)
            .committed()
            .to_path_buf(),
        None => local.committed().to_path_buf(),
    }
}
