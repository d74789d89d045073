use chrono::NaiveDate;
use std::path::{Path, PathBuf};

/// Suffix promoting a staging directory to its committed form.
pub const COMMITTED_SUFFIX: &str = "_succ";

/// Staging paths for one job: the uncommitted assembly directory and the
/// committed directory it is renamed to. Exactly one of the two exists once
/// the commit stage has run; both are absent before the job starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagingLocation {
    uncommitted: PathBuf,
    committed: PathBuf,
}

impl StagingLocation {
    /// Derives the staging location from the base directory, the run date
    /// and the job id: `<base>/<YYYY-MM-DD>/<job_id>`.
    pub fn derive(base: &str, job_id: &str, date: NaiveDate) -> Self {
        let uncommitted = Path::new(base)
            .join(date.format("%Y-%m-%d").to_string())
            .join(job_id);
        let committed = Self::committed_sibling(&uncommitted);
        StagingLocation {
            uncommitted,
            committed,
        }
    }

    pub fn for_today(base: &str, job_id: &str) -> Self {
        Self::derive(base, job_id, chrono::Utc::now().date_naive())
    }

    /// Shard files are assembled here before the commit rename.
    pub fn uncommitted(&self) -> &Path {
        &self.uncommitted
    }

    /// Existence of this path is the only valid success signal.
    pub fn committed(&self) -> &Path {
        &self.committed
    }

    fn committed_sibling(uncommitted: &Path) -> PathBuf {
        let mut name = uncommitted
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        name.push_str(COMMITTED_SUFFIX);
        uncommitted.with_file_name(name)
    }
}
