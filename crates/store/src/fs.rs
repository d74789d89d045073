use crate::error::StoreError;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// A file found under a staging tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub path: PathBuf,
    pub len: u64,
}

/// Filesystem operations the staging lifecycle needs from an environment:
/// existence checks, recursive deletes, the commit rename, marker creation
/// and recursive listing.
#[async_trait]
pub trait StagingStore: Send + Sync {
    async fn exists(&self, path: &Path) -> Result<bool, StoreError>;

    /// Removes `path` and everything under it. Missing paths are not an
    /// error.
    async fn remove_tree(&self, path: &Path) -> Result<(), StoreError>;

    /// Atomically renames `from` to `to`.
    async fn rename(&self, from: &Path, to: &Path) -> Result<(), StoreError>;

    /// Creates a zero-byte file named `name` inside `dir`.
    async fn create_marker(&self, dir: &Path, name: &str) -> Result<(), StoreError>;

    /// All regular files under `root`, recursively.
    async fn list_files(&self, root: &Path) -> Result<Vec<FileEntry>, StoreError>;
}

/// Local-filesystem staging binding over `tokio::fs`.
#[derive(Debug, Default, Clone)]
pub struct LocalStagingStore;

#[async_trait]
impl StagingStore for LocalStagingStore {
    async fn exists(&self, path: &Path) -> Result<bool, StoreError> {
        Ok(tokio::fs::try_exists(path).await?)
    }

    async fn remove_tree(&self, path: &Path) -> Result<(), StoreError> {
        match tokio::fs::remove_dir_all(path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    async fn rename(&self, from: &Path, to: &Path) -> Result<(), StoreError> {
        if let Some(parent) = to.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        Ok(tokio::fs::rename(from, to).await?)
    }

    async fn create_marker(&self, dir: &Path, name: &str) -> Result<(), StoreError> {
        tokio::fs::create_dir_all(dir).await?;
        Ok(tokio::fs::write(dir.join(name), b"").await?)
    }

    async fn list_files(&self, root: &Path) -> Result<Vec<FileEntry>, StoreError> {
        walk_files(root).await
    }
}

/// Recursively collects regular files under `root`, sorted by path so
/// listings are stable.
pub async fn walk_files(root: &Path) -> Result<Vec<FileEntry>, StoreError> {
    let mut files = Vec::new();
    let mut pending = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        let mut entries = tokio::fs::read_dir(&dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let metadata = entry.metadata().await?;
            if metadata.is_dir() {
                pending.push(entry.path());
            } else {
                files.push(FileEntry {
                    path: entry.path(),
                    len: metadata.len(),
                });
            }
        }
    }

    files.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn remove_tree_tolerates_missing_paths() {
        let fs = LocalStagingStore;
        let dir = tempfile::tempdir().unwrap();
        fs.remove_tree(&dir.path().join("nope")).await.unwrap();
    }

    #[tokio::test]
    async fn markers_are_zero_bytes() {
        let fs = LocalStagingStore;
        let dir = tempfile::tempdir().unwrap();
        fs.create_marker(dir.path(), "done.succ").await.unwrap();

        let meta = tokio::fs::metadata(dir.path().join("done.succ"))
            .await
            .unwrap();
        assert_eq!(meta.len(), 0);
    }

    #[tokio::test]
    async fn listing_walks_nested_directories() {
        let fs = LocalStagingStore;
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::create_dir_all(dir.path().join("cf")).await.unwrap();
        tokio::fs::write(dir.path().join("cf/part-0"), b"abc")
            .await
            .unwrap();
        tokio::fs::write(dir.path().join("cf/part-1"), b"defg")
            .await
            .unwrap();

        let files = fs.list_files(dir.path()).await.unwrap();
        assert_eq!(files.len(), 2);
        assert_eq!(files.iter().map(|f| f.len).sum::<u64>(), 7);
    }

    #[tokio::test]
    async fn rename_creates_destination_parent() {
        let fs = LocalStagingStore;
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("a");
        tokio::fs::create_dir_all(&src).await.unwrap();

        let dest = dir.path().join("deep/nested/b");
        fs.rename(&src, &dest).await.unwrap();
        assert!(fs.exists(&dest).await.unwrap());
        assert!(!fs.exists(&src).await.unwrap());
    }
}
