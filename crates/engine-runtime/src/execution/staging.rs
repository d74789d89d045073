use crate::error::PipelineError;
use model::staging::StagingLocation;
use store::fs::StagingStore;
use tracing::{debug, warn};

/// Drives the staging directory lifecycle for one job:
/// pre-clear before writing, the atomic commit rename on success, and
/// best-effort cleanup on failure.
pub struct StagingCommitter<'a> {
    fs: &'a dyn StagingStore,
    location: &'a StagingLocation,
    job_id: &'a str,
}

impl<'a> StagingCommitter<'a> {
    pub fn new(fs: &'a dyn StagingStore, location: &'a StagingLocation, job_id: &'a str) -> Self {
        StagingCommitter {
            fs,
            location,
            job_id,
        }
    }

    /// Deletes any stale uncommitted or committed path left behind by a
    /// previous run of the same job id.
    pub async fn prepare(&self) -> Result<(), PipelineError> {
        for path in [self.location.uncommitted(), self.location.committed()] {
            let existed = self
                .fs
                .exists(path)
                .await
                .map_err(PipelineError::Staging)?;
            if existed {
                warn!(
                    job_id = self.job_id,
                    path = %path.display(),
                    "stale staging path exists, clearing"
                );
                self.fs
                    .remove_tree(path)
                    .await
                    .map_err(PipelineError::Staging)?;
            }
        }
        Ok(())
    }

    /// Promotes the staging directory to its committed form. This rename is
    /// the single atomicity point of the pipeline: only the committed
    /// path's existence signals success.
    pub async fn commit(&self) -> Result<(), PipelineError> {
        self.fs
            .rename(self.location.uncommitted(), self.location.committed())
            .await
            .map_err(PipelineError::Commit)?;
        debug!(
            job_id = self.job_id,
            path = %self.location.committed().display(),
            "staging directory committed"
        );
        Ok(())
    }

    /// Best-effort removal of the uncommitted directory after a failure.
    /// A cleanup failure is logged but never masks the original error.
    pub async fn abandon(&self) {
        if let Err(err) = self.fs.remove_tree(self.location.uncommitted()).await {
            warn!(
                job_id = self.job_id,
                path = %self.location.uncommitted().display(),
                error = %err,
                "failed to clean up uncommitted staging directory"
            );
        }
    }
}
