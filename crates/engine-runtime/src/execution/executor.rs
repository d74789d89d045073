use crate::{
    engine::PartitionEngine,
    error::{JobError, PipelineError, Stage},
    execution::{
        metadata,
        replicate::{ReplicationBindings, ReplicationCoordinator},
        shard::{ShardEncoder, ShardWriteParams, ShardWriter},
        staging::StagingCommitter,
        stats,
    },
};
use engine_config::validator::JobValidator;
use model::{core::row::Row, job::JobSpec, mapping::CellMapper, staging::StagingLocation};
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, path::PathBuf, sync::Arc};
use store::{client::PartitionedStoreClient, fs::StagingStore, session::SessionFactory};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Collaborators the pipeline runs against. Destination-environment
/// bindings are present only for replicating jobs.
pub struct PipelineDeps {
    pub sessions: Arc<dyn SessionFactory>,
    pub source_client: Arc<dyn PartitionedStoreClient>,
    pub source_fs: Arc<dyn StagingStore>,
    pub engine: Arc<dyn PartitionEngine>,
    pub encoder: Arc<dyn ShardEncoder>,
    pub replication: Option<ReplicationBindings>,
}

/// Terminal status of a successful run. A replicated job reports where the
/// shards were loaded remotely; a local-only job reports the committed
/// path.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JobReport {
    pub job_id: String,
    pub table: String,
    pub shards: usize,
    pub cells: u64,
    pub bytes: u64,
    pub committed_path: PathBuf,
    pub replicated_to: Option<PathBuf>,
}

/// Validates the flat option map and runs the job, so configuration
/// failures surface stage-tagged like every other fatal error.
pub async fn validate_and_run(
    job_id: &str,
    options: &HashMap<String, String>,
    rows: Vec<Row>,
    deps: PipelineDeps,
    cancel: CancellationToken,
) -> Result<JobReport, JobError> {
    let spec = JobValidator::new(job_id, options)
        .validate()
        .map_err(|err| JobError::at(job_id, Stage::Validate, PipelineError::Config(err)))?;
    run(spec, rows, deps, cancel).await
}

/// Runs one pre-validated bulk-ingest job to its terminal state.
pub async fn run(
    spec: JobSpec,
    rows: Vec<Row>,
    deps: PipelineDeps,
    cancel: CancellationToken,
) -> Result<JobReport, JobError> {
    JobExecutor {
        spec,
        rows: Arc::new(rows),
        deps,
        cancel,
    }
    .execute()
    .await
}

struct JobExecutor {
    spec: JobSpec,
    rows: Arc<Vec<Row>>,
    deps: PipelineDeps,
    cancel: CancellationToken,
}

impl JobExecutor {
    /// Sequences the stages with strict ordering: no stage starts before
    /// the previous one fully completed, and every collaborator failure is
    /// surfaced as one error tagged with job id and stage.
    async fn execute(self) -> Result<JobReport, JobError> {
        let job_id = self.spec.job_id.clone();
        info!(job_id, table = self.spec.table, "starting bulk-ingest job");

        // Authenticate against the source environment.
        self.ensure_active(Stage::Authenticate)?;
        let session = self
            .deps
            .sessions
            .establish_session(&self.spec.source_env)
            .await
            .map_err(|err| self.fail(Stage::Authenticate, PipelineError::Auth(err)))?;
        info!(job_id, environment = self.spec.source_env.name, "source session established");

        // Partition metadata, fetched once and immutable afterwards.
        self.ensure_active(Stage::Metadata)?;
        let metadata = metadata::resolve(
            self.deps.source_client.as_ref(),
            &session,
            &self.spec.table,
        )
        .await
        .map_err(|err| self.fail(Stage::Metadata, err))?;
        let metadata = Arc::new(metadata);

        let location = StagingLocation::for_today(&self.spec.staging_base_dir, &self.spec.job_id);
        let committer =
            StagingCommitter::new(self.deps.source_fs.as_ref(), &location, &self.spec.job_id);

        // Pre-clear stale paths from any earlier run of this job id.
        self.ensure_active(Stage::Prepare)?;
        committer
            .prepare()
            .await
            .map_err(|err| self.fail(Stage::Prepare, err))?;

        // Shard construction, one task per partition, all-or-nothing.
        self.ensure_active(Stage::ShardWrite)?;
        let mapper = Arc::new(CellMapper::for_modes(
            self.spec.write_mode,
            self.spec.mapping_mode,
            metadata.primary_family(),
            &self.spec.merge_qualifier,
        ));
        let params = ShardWriteParams {
            max_size: self.spec.shard_max_size,
            timestamp: self
                .spec
                .shard_timestamp
                .unwrap_or_else(|| chrono::Utc::now().timestamp_millis()),
            compaction_exclude: self.spec.compaction_exclude,
        };
        let writer = ShardWriter::new(self.deps.engine.clone(), self.deps.encoder.clone());
        let summary = match writer
            .write_all(
                &self.spec.job_id,
                self.rows.clone(),
                metadata.clone(),
                mapper,
                location.uncommitted(),
                params,
                &self.cancel,
            )
            .await
        {
            Ok(summary) => summary,
            Err(err) => {
                // Never leave partial shard files behind.
                committer.abandon().await;
                return Err(self.fail(Stage::ShardWrite, err));
            }
        };

        // The atomic commit rename.
        self.ensure_active(Stage::Commit)?;
        if let Err(err) = committer.commit().await {
            committer.abandon().await;
            return Err(self.fail(Stage::Commit, err));
        }

        // Statistics are best-effort and never fail the job.
        if let Err(err) = stats::report(
            self.deps.source_fs.as_ref(),
            location.committed(),
            &self.spec.job_id,
        )
        .await
        {
            warn!(job_id, error = %err, "shard statistics failed");
        }

        // Optional cross-environment replication.
        let mut replicated_to = None;
        if let Some(replication) = &self.spec.replication {
            self.ensure_active(Stage::Replication)?;
            let bindings = self.deps.replication.as_ref().ok_or_else(|| {
                self.fail(
                    Stage::Replication,
                    PipelineError::Replication(
                        "no destination bindings configured".to_string(),
                    ),
                )
            })?;
            let coordinator = ReplicationCoordinator::new(
                self.deps.sessions.as_ref(),
                bindings,
                self.deps.source_fs.as_ref(),
            );
            let remote = coordinator
                .run(&self.spec, replication, &location)
                .await
                .map_err(|err| self.fail(Stage::Replication, err))?;
            replicated_to = Some(remote);
        }

        info!(job_id, table = self.spec.table, "bulk-ingest job finished");
        Ok(JobReport {
            job_id: self.spec.job_id.clone(),
            table: self.spec.table.clone(),
            shards: summary.shards,
            cells: summary.cells,
            bytes: summary.bytes,
            committed_path: location.committed().to_path_buf(),
            replicated_to,
        })
    }

    /// Cooperative cancellation, checked before each stage begins.
    fn ensure_active(&self, stage: Stage) -> Result<(), JobError> {
        if self.cancel.is_cancelled() {
            warn!(
                job_id = self.spec.job_id,
                stage = %stage,
                "cancellation requested before stage"
            );
            return Err(self.fail(stage, PipelineError::Cancelled));
        }
        Ok(())
    }

    fn fail(&self, stage: Stage, source: PipelineError) -> JobError {
        JobError::at(&self.spec.job_id, stage, source)
    }
}
