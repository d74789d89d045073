use std::path::Path;
use store::{error::StoreError, fs::StagingStore};
use tracing::info;

/// Lists the committed shard tree and logs a per-file and total size
/// summary. Purely observability: the caller catches and logs any error,
/// the job never fails here.
pub async fn report(
    fs: &dyn StagingStore,
    committed: &Path,
    job_id: &str,
) -> Result<(), StoreError> {
    let files = fs.list_files(committed).await?;

    let mut total: u64 = 0;
    let mut summary = String::new();
    for (idx, file) in files.iter().enumerate() {
        let name = file
            .path
            .strip_prefix(committed)
            .unwrap_or(&file.path)
            .display();
        summary.push_str(&format!("  shard_{idx} {name}: {}\n", human_bytes(file.len)));
        total += file.len;
    }

    info!(
        job_id,
        path = %committed.display(),
        files = files.len(),
        total = %human_bytes(total),
        "committed shard files:\n{summary}"
    );
    Ok(())
}

/// Human-readable byte count, largest whole unit.
pub fn human_bytes(len: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    let mut value = len as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{len} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use store::fs::LocalStagingStore;

    #[test]
    fn bytes_format_with_whole_units() {
        assert_eq!(human_bytes(512), "512 B");
        assert_eq!(human_bytes(2048), "2.0 KB");
        assert_eq!(human_bytes(5 * 1024 * 1024), "5.0 MB");
    }

    #[tokio::test]
    async fn missing_committed_path_surfaces_an_error_to_the_caller() {
        let dir = tempfile::tempdir().unwrap();
        let err = report(&LocalStagingStore, &dir.path().join("absent"), "job-1").await;
        assert!(err.is_err());
    }
}
