//! End-to-end pipeline tests over local bindings and recording fakes.

use async_trait::async_trait;
use engine_runtime::{
    engine::TokioPartitionEngine,
    error::{PipelineError, Stage},
    execution::{
        executor::{self, PipelineDeps},
        replicate::{COPY_MARKER, ReplicationBindings},
        shard::{JsonShardEncoder, ShardEncoder, ShardWriteParams},
    },
};
use model::{
    core::{
        cell::ShardCell,
        row::{FieldValue, Row},
        value::Value,
    },
    job::{Environment, JobSpec, MappingMode, ReplicationSpec, WriteMode},
    partition::PartitionMetadata,
};
use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};
use store::{
    client::PartitionedStoreClient,
    copier::{BulkCopier, CopyLimits, CopySummary, ThrottledCopier},
    error::StoreError,
    fs::{FileEntry, LocalStagingStore, StagingStore},
    session::{PropertySessionFactory, SessionHandle},
};
use tokio_util::sync::CancellationToken;

type EventLog = Arc<Mutex<Vec<String>>>;

fn log(events: &EventLog, event: &str) {
    events.lock().unwrap().push(event.to_string());
}

struct FakeClient {
    start_keys: Vec<Vec<u8>>,
    families: Vec<String>,
    loads: Arc<Mutex<Vec<PathBuf>>>,
    events: Option<EventLog>,
}

impl FakeClient {
    fn new(start_keys: &[&str]) -> Self {
        FakeClient {
            start_keys: start_keys.iter().map(|k| k.as_bytes().to_vec()).collect(),
            families: vec!["cf".to_string()],
            loads: Arc::new(Mutex::new(Vec::new())),
            events: None,
        }
    }

    fn with_events(mut self, events: EventLog) -> Self {
        self.events = Some(events);
        self
    }
}

#[async_trait]
impl PartitionedStoreClient for FakeClient {
    async fn table_layout(
        &self,
        _session: &SessionHandle,
        _table: &str,
    ) -> Result<PartitionMetadata, StoreError> {
        Ok(PartitionMetadata::new(
            self.start_keys.clone(),
            self.families.clone(),
        )?)
    }

    async fn load_shards(
        &self,
        _session: &SessionHandle,
        _table: &str,
        committed: &Path,
    ) -> Result<(), StoreError> {
        if let Some(events) = &self.events {
            log(events, "load");
        }
        self.loads.lock().unwrap().push(committed.to_path_buf());
        Ok(())
    }
}

/// Staging store that records marker creation order.
struct RecordingFs {
    inner: LocalStagingStore,
    events: EventLog,
}

#[async_trait]
impl StagingStore for RecordingFs {
    async fn exists(&self, path: &Path) -> Result<bool, StoreError> {
        self.inner.exists(path).await
    }

    async fn remove_tree(&self, path: &Path) -> Result<(), StoreError> {
        self.inner.remove_tree(path).await
    }

    async fn rename(&self, from: &Path, to: &Path) -> Result<(), StoreError> {
        self.inner.rename(from, to).await
    }

    async fn create_marker(&self, dir: &Path, name: &str) -> Result<(), StoreError> {
        log(&self.events, "marker");
        self.inner.create_marker(dir, name).await
    }

    async fn list_files(&self, root: &Path) -> Result<Vec<FileEntry>, StoreError> {
        self.inner.list_files(root).await
    }
}

struct RecordingCopier {
    inner: ThrottledCopier,
    events: EventLog,
}

#[async_trait]
impl BulkCopier for RecordingCopier {
    async fn copy_tree(
        &self,
        src: &Path,
        dest: &Path,
        limits: &CopyLimits,
    ) -> Result<CopySummary, StoreError> {
        log(&self.events, "copy");
        self.inner.copy_tree(src, dest, limits).await
    }
}

/// Encoder that fails one specific partition file.
struct FailingEncoder {
    inner: JsonShardEncoder,
    poison: &'static str,
}

#[async_trait]
impl ShardEncoder for FailingEncoder {
    async fn write_shard(
        &self,
        path: &Path,
        cells: &[ShardCell],
        params: &ShardWriteParams,
    ) -> Result<u64, StoreError> {
        if path.to_string_lossy().contains(self.poison) {
            return Err(StoreError::Io(std::io::Error::other("disk on fire")));
        }
        self.inner.write_shard(path, cells, params).await
    }
}

fn sample_rows() -> Vec<Row> {
    vec![
        Row::new(b"apple".to_vec(), vec![FieldValue::new("a", Value::Int(1))]),
        Row::new(b"grape".to_vec(), vec![FieldValue::new("a", Value::Int(2))]),
        Row::new(b"peach".to_vec(), vec![FieldValue::new("a", Value::Int(3))]),
        Row::new(b"zebra".to_vec(), vec![FieldValue::new("b", Value::Int(4))]),
    ]
}

fn job_spec(staging_base: &Path, replication: Option<ReplicationSpec>) -> JobSpec {
    JobSpec {
        job_id: "job-42".to_string(),
        table: "events".to_string(),
        staging_base_dir: staging_base.to_string_lossy().into_owned(),
        write_mode: WriteMode::BulkLoad,
        mapping_mode: MappingMode::OneToOne,
        merge_qualifier: "merge".to_string(),
        shard_max_size: 64 * 1024 * 1024,
        shard_timestamp: Some(1_700_000_000_000),
        compaction_exclude: false,
        source_env: Environment::named("source"),
        replication,
    }
}

fn base_deps(client: FakeClient, replication: Option<ReplicationBindings>) -> PipelineDeps {
    PipelineDeps {
        sessions: Arc::new(PropertySessionFactory),
        source_client: Arc::new(client),
        source_fs: Arc::new(LocalStagingStore),
        engine: Arc::new(TokioPartitionEngine),
        encoder: Arc::new(JsonShardEncoder),
        replication,
    }
}

fn committed_shards(committed: &Path) -> Vec<PathBuf> {
    let mut shards = Vec::new();
    for entry in std::fs::read_dir(committed.join("cf")).unwrap() {
        shards.push(entry.unwrap().path());
    }
    shards.sort();
    shards
}

#[tokio::test]
async fn successful_run_commits_exactly_one_shard_per_partition() {
    let staging = tempfile::tempdir().unwrap();
    let spec = job_spec(staging.path(), None);
    let deps = base_deps(FakeClient::new(&["", "g", "p"]), None);

    let report = executor::run(spec, sample_rows(), deps, CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.shards, 3);
    assert_eq!(report.cells, 4);
    assert!(report.replicated_to.is_none());

    let shards = committed_shards(&report.committed_path);
    assert_eq!(shards.len(), 3);

    // The uncommitted sibling must be gone: commit is total, never partial.
    let uncommitted = report
        .committed_path
        .to_string_lossy()
        .trim_end_matches("_succ")
        .to_string();
    assert!(!Path::new(&uncommitted).exists());
}

#[tokio::test]
async fn shard_failure_cleans_up_the_uncommitted_staging_path() {
    let staging = tempfile::tempdir().unwrap();
    let spec = job_spec(staging.path(), None);
    let mut deps = base_deps(FakeClient::new(&["", "g", "p"]), None);
    deps.encoder = Arc::new(FailingEncoder {
        inner: JsonShardEncoder,
        poison: "part-00001",
    });

    let err = executor::run(spec, sample_rows(), deps, CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(err.job_id, "job-42");
    assert_eq!(err.stage, Stage::ShardWrite);
    assert!(matches!(err.source, PipelineError::ShardBuild(_)));

    // Neither staging form may exist after the failure surfaced.
    let mut walker = std::fs::read_dir(staging.path()).unwrap();
    if let Some(date_dir) = walker.next() {
        let date_dir = date_dir.unwrap().path();
        assert_eq!(std::fs::read_dir(&date_dir).unwrap().count(), 0);
    }
}

#[tokio::test]
async fn non_replicating_job_never_touches_destination_collaborators() {
    let staging = tempfile::tempdir().unwrap();
    let dest_events: EventLog = Arc::new(Mutex::new(Vec::new()));
    let dest_client = FakeClient::new(&[""]).with_events(dest_events.clone());
    let dest_loads = dest_client.loads.clone();

    let bindings = ReplicationBindings {
        client: Arc::new(dest_client),
        fs: Arc::new(RecordingFs {
            inner: LocalStagingStore,
            events: dest_events.clone(),
        }),
        copier: Arc::new(RecordingCopier {
            inner: ThrottledCopier,
            events: dest_events.clone(),
        }),
    };

    let spec = job_spec(staging.path(), None);
    let deps = base_deps(FakeClient::new(&["", "g"]), Some(bindings));

    executor::run(spec, sample_rows(), deps, CancellationToken::new())
        .await
        .unwrap();

    assert!(dest_events.lock().unwrap().is_empty());
    assert!(dest_loads.lock().unwrap().is_empty());
}

#[tokio::test]
async fn replication_marks_copy_then_loads_then_deletes_local() {
    let staging = tempfile::tempdir().unwrap();
    let remote_base = tempfile::tempdir().unwrap();
    let events: EventLog = Arc::new(Mutex::new(Vec::new()));

    let dest_client = FakeClient::new(&[""]).with_events(events.clone());
    let dest_loads = dest_client.loads.clone();
    let bindings = ReplicationBindings {
        client: Arc::new(dest_client),
        fs: Arc::new(RecordingFs {
            inner: LocalStagingStore,
            events: events.clone(),
        }),
        copier: Arc::new(RecordingCopier {
            inner: ThrottledCopier,
            events: events.clone(),
        }),
    };

    let replication = ReplicationSpec {
        dest_env: Environment::named("dest"),
        max_tasks: 2,
        bandwidth_mb: 100,
        remote_base: Some(remote_base.path().to_string_lossy().into_owned()),
    };
    let spec = job_spec(staging.path(), Some(replication));
    let deps = base_deps(FakeClient::new(&["", "g", "p"]), Some(bindings));

    let report = executor::run(spec, sample_rows(), deps, CancellationToken::new())
        .await
        .unwrap();

    let remote = report.replicated_to.clone().unwrap();

    // Marker exists at the remote root, copy happened before it, and the
    // load was issued exactly once, after the marker.
    assert!(remote.join(COPY_MARKER).exists());
    assert_eq!(
        *events.lock().unwrap(),
        vec!["copy".to_string(), "marker".to_string(), "load".to_string()]
    );
    let loads = dest_loads.lock().unwrap();
    assert_eq!(loads.len(), 1);
    assert_eq!(loads[0], remote);

    // Remote tree carries all three shards plus the marker.
    assert_eq!(committed_shards(&remote).len(), 3);

    // Local committed copy reclaimed after the successful remote load.
    assert!(!report.committed_path.exists());
}

#[tokio::test]
async fn replication_without_remote_base_loads_the_committed_tree_in_place() {
    let staging = tempfile::tempdir().unwrap();
    let events: EventLog = Arc::new(Mutex::new(Vec::new()));

    let dest_client = FakeClient::new(&[""]).with_events(events.clone());
    let dest_loads = dest_client.loads.clone();
    let bindings = ReplicationBindings {
        client: Arc::new(dest_client),
        fs: Arc::new(RecordingFs {
            inner: LocalStagingStore,
            events: events.clone(),
        }),
        copier: Arc::new(RecordingCopier {
            inner: ThrottledCopier,
            events: events.clone(),
        }),
    };

    let replication = ReplicationSpec {
        dest_env: Environment::named("dest"),
        max_tasks: 2,
        bandwidth_mb: 100,
        remote_base: None,
    };
    let spec = job_spec(staging.path(), Some(replication));
    let deps = base_deps(FakeClient::new(&["", "g", "p"]), Some(bindings));

    let report = executor::run(spec, sample_rows(), deps, CancellationToken::new())
        .await
        .unwrap();

    // The committed tree doubles as the remote path: no copy runs, the
    // marker and load happen in place, and the tree survives with its
    // shards intact.
    assert_eq!(
        report.replicated_to.as_deref(),
        Some(report.committed_path.as_path())
    );
    assert_eq!(
        *events.lock().unwrap(),
        vec!["marker".to_string(), "load".to_string()]
    );
    assert_eq!(dest_loads.lock().unwrap().len(), 1);
    assert!(report.committed_path.join(COPY_MARKER).exists());

    let shards = committed_shards(&report.committed_path);
    assert_eq!(shards.len(), 3);
    assert!(
        shards
            .iter()
            .all(|p| std::fs::metadata(p).unwrap().len() > 0)
    );
}

#[tokio::test]
async fn invalid_options_fail_at_the_validate_stage_before_any_io() {
    let staging = tempfile::tempdir().unwrap();
    let mut options = HashMap::new();
    options.insert("table".to_string(), "events".to_string());
    options.insert(
        "stagingBaseDir".to_string(),
        staging.path().to_string_lossy().into_owned(),
    );
    options.insert("writeMode".to_string(), "bogus".to_string());
    options.insert("mappingMode".to_string(), "one2one".to_string());
    options.insert("doReplicate".to_string(), "false".to_string());

    let deps = base_deps(FakeClient::new(&[""]), None);
    let err = executor::validate_and_run(
        "job-42",
        &options,
        sample_rows(),
        deps,
        CancellationToken::new(),
    )
    .await
    .unwrap_err();

    assert_eq!(err.job_id, "job-42");
    assert_eq!(err.stage, Stage::Validate);
    assert!(matches!(err.source, PipelineError::Config(_)));
    assert_eq!(std::fs::read_dir(staging.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn stale_paths_from_a_prior_run_are_cleared_before_writing() {
    let staging = tempfile::tempdir().unwrap();
    let spec = job_spec(staging.path(), None);

    // Simulate leftovers of a previous failed run with the same job id.
    let stale =
        model::staging::StagingLocation::for_today(&spec.staging_base_dir, &spec.job_id);
    std::fs::create_dir_all(stale.uncommitted().join("cf")).unwrap();
    std::fs::write(stale.uncommitted().join("cf/old.shard"), b"stale").unwrap();
    std::fs::create_dir_all(stale.committed().join("cf")).unwrap();
    std::fs::write(stale.committed().join("cf/old.shard"), b"stale").unwrap();

    let deps = base_deps(FakeClient::new(&["", "g"]), None);
    let report = executor::run(spec, sample_rows(), deps, CancellationToken::new())
        .await
        .unwrap();

    let shards = committed_shards(&report.committed_path);
    assert_eq!(shards.len(), 2);
    assert!(shards.iter().all(|p| !p.ends_with("old.shard")));
    assert!(!stale.uncommitted().exists());
}

#[tokio::test]
async fn cancellation_before_the_first_stage_does_no_work() {
    let staging = tempfile::tempdir().unwrap();
    let spec = job_spec(staging.path(), None);
    let deps = base_deps(FakeClient::new(&[""]), None);

    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = executor::run(spec, sample_rows(), deps, cancel)
        .await
        .unwrap_err();
    assert_eq!(err.stage, Stage::Authenticate);
    assert!(matches!(err.source, PipelineError::Cancelled));

    // Nothing was staged.
    assert_eq!(std::fs::read_dir(staging.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn replicating_spec_without_bindings_fails_at_the_replication_stage() {
    let staging = tempfile::tempdir().unwrap();
    let replication = ReplicationSpec {
        dest_env: Environment::named("dest"),
        max_tasks: 1,
        bandwidth_mb: 1,
        remote_base: None,
    };
    let spec = job_spec(staging.path(), Some(replication));
    let deps = base_deps(FakeClient::new(&[""]), None);

    let err = executor::run(spec, sample_rows(), deps, CancellationToken::new())
        .await
        .unwrap_err();
    assert_eq!(err.stage, Stage::Replication);
    assert!(matches!(err.source, PipelineError::Replication(_)));
}
