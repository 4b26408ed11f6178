//! Stand-in reconstructor that returns a pre-built sample model.
//!
//! Used until a real photogrammetry pipeline is wired in. It honours the
//! [`Reconstructor`] contract (delay, failure on empty input, failure when
//! the sample is missing) so the rest of the service behaves as it would
//! in production.

use std::path::PathBuf;
use std::time::Duration;

use carscan_core::types::JobId;

use crate::reconstruct::{ReconstructionError, Reconstructor};

/// File name of the artifact produced for every job.
pub const ARTIFACT_FILE_NAME: &str = "car_scan.glb";

#[derive(Debug, Clone)]
pub struct SampleReconstructor {
    sample_path: PathBuf,
    work_dir: PathBuf,
    delay: Duration,
}

impl SampleReconstructor {
    /// `work_dir` receives one scratch directory per job holding the
    /// produced artifact until it is published.
    pub fn new(sample_path: impl Into<PathBuf>, work_dir: impl Into<PathBuf>, delay: Duration) -> Self {
        Self {
            sample_path: sample_path.into(),
            work_dir: work_dir.into(),
            delay,
        }
    }

    fn sample_name(&self) -> String {
        self.sample_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.sample_path.display().to_string())
    }
}

impl Reconstructor for SampleReconstructor {
    async fn reconstruct(&self, job_id: JobId, inputs: Vec<PathBuf>) -> Result<PathBuf, ReconstructionError> {
        if inputs.is_empty() {
            return Err(ReconstructionError::NoInput);
        }

        tracing::debug!(
            job_id = %job_id,
            inputs = inputs.len(),
            delay_ms = self.delay.as_millis() as u64,
            "Simulating reconstruction",
        );
        tokio::time::sleep(self.delay).await;

        match tokio::fs::try_exists(&self.sample_path).await {
            Ok(true) => {}
            Ok(false) => return Err(ReconstructionError::ModelUnavailable(self.sample_name())),
            Err(e) => {
                return Err(ReconstructionError::Failed(format!(
                    "failed to check sample model: {e}"
                )));
            }
        }

        let scratch = self.work_dir.join(job_id.to_string());
        tokio::fs::create_dir_all(&scratch)
            .await
            .map_err(|e| ReconstructionError::Failed(format!("failed to create work dir: {e}")))?;

        let artifact = scratch.join(ARTIFACT_FILE_NAME);
        tokio::fs::copy(&self.sample_path, &artifact)
            .await
            .map_err(|e| ReconstructionError::Failed(format!("failed to write artifact: {e}")))?;

        Ok(artifact)
    }

    async fn discard(&self, job_id: JobId) {
        let scratch = self.work_dir.join(job_id.to_string());
        match tokio::fs::remove_dir_all(&scratch).await {
            Ok(()) => tracing::debug!(job_id = %job_id, "Scratch directory removed"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(
                    job_id = %job_id,
                    path = %scratch.display(),
                    error = %e,
                    "Failed to remove scratch directory",
                );
            }
        }
    }
}
