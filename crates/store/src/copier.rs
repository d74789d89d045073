use crate::{error::StoreError, fs::walk_files};
use async_trait::async_trait;
use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    sync::Semaphore,
    time::Instant,
};
use tracing::debug;

const COPY_CHUNK: usize = 1024 * 1024;

/// Bounds on a bulk copy: both are mandatory once replication is enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CopyLimits {
    /// Maximum number of files copied concurrently.
    pub max_tasks: usize,
    /// Per-task bandwidth cap in MB/s.
    pub bandwidth_mb: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CopySummary {
    pub files: usize,
    pub bytes: u64,
}

/// Copies a whole directory tree between environments. The pipeline blocks
/// on completion; implementations parallelize internally up to the
/// configured bound.
#[async_trait]
pub trait BulkCopier: Send + Sync {
    async fn copy_tree(
        &self,
        src: &Path,
        dest: &Path,
        limits: &CopyLimits,
    ) -> Result<CopySummary, StoreError>;
}

/// Local bulk copier: one task per file, at most `max_tasks` in flight,
/// each paced to the per-task bandwidth cap.
#[derive(Debug, Default, Clone)]
pub struct ThrottledCopier;

#[async_trait]
impl BulkCopier for ThrottledCopier {
    async fn copy_tree(
        &self,
        src: &Path,
        dest: &Path,
        limits: &CopyLimits,
    ) -> Result<CopySummary, StoreError> {
        if limits.max_tasks == 0 || limits.bandwidth_mb == 0 {
            return Err(StoreError::Copy(
                "copy limits must be positive".to_string(),
            ));
        }
        // Copying a tree onto itself truncates every file before it is
        // read; nested paths degenerate the same way.
        if dest.starts_with(src) || src.starts_with(dest) {
            return Err(StoreError::Copy(format!(
                "source {} and destination {} overlap",
                src.display(),
                dest.display()
            )));
        }

        let files = walk_files(src).await?;
        let semaphore = Arc::new(Semaphore::new(limits.max_tasks));
        let bandwidth = limits.bandwidth_mb;

        let mut handles = Vec::with_capacity(files.len());
        for file in &files {
            let relative = file
                .path
                .strip_prefix(src)
                .map_err(|err| StoreError::Copy(err.to_string()))?;
            let from = file.path.clone();
            let to = dest.join(relative);
            let permits = semaphore.clone();

            handles.push(tokio::spawn(async move {
                let _permit = permits
                    .acquire_owned()
                    .await
                    .map_err(|err| StoreError::Copy(err.to_string()))?;
                copy_file_throttled(&from, &to, bandwidth).await
            }));
        }

        let mut summary = CopySummary {
            files: files.len(),
            bytes: 0,
        };
        for handle in handles {
            let copied = handle
                .await
                .map_err(|err| StoreError::Copy(err.to_string()))??;
            summary.bytes += copied;
        }

        debug!(
            files = summary.files,
            bytes = summary.bytes,
            "bulk copy finished"
        );
        Ok(summary)
    }
}

/// Copies one file in chunks, sleeping between chunks so the sustained rate
/// stays at or below `bandwidth_mb` MB/s.
async fn copy_file_throttled(
    from: &Path,
    to: &PathBuf,
    bandwidth_mb: u64,
) -> Result<u64, StoreError> {
    if let Some(parent) = to.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let mut reader = tokio::fs::File::open(from).await?;
    let mut writer = tokio::fs::File::create(to).await?;

    let budget_per_sec = bandwidth_mb.saturating_mul(1024 * 1024).max(1);
    let started = Instant::now();
    let mut copied: u64 = 0;
    let mut buf = vec![0u8; COPY_CHUNK];

    loop {
        let read = reader.read(&mut buf).await?;
        if read == 0 {
            break;
        }
        writer.write_all(&buf[..read]).await?;
        copied += read as u64;

        // Sleep until the pace falls back under the cap.
        let expected = Duration::from_secs_f64(copied as f64 / budget_per_sec as f64);
        let elapsed = started.elapsed();
        if expected > elapsed {
            tokio::time::sleep(expected - elapsed).await;
        }
    }

    writer.flush().await?;
    Ok(copied)
}
