//! The seam between the job manager and the reconstruction pipeline.

use std::future::Future;
use std::path::PathBuf;

use carscan_core::types::JobId;

/// Result of processing one job, as reported back to the job manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Location of the produced artifact, to be published.
    Success(PathBuf),
    /// Human-readable reason, recorded as the job's `error`.
    Failure(String),
}

/// Domain-level reconstruction failures.
#[derive(Debug, thiserror::Error)]
pub enum ReconstructionError {
    #[error("no usable input")]
    NoInput,

    #[error("{0} not found on server")]
    ModelUnavailable(String),

    #[error("{0}")]
    Failed(String),
}

/// Turns a job's ordered input images into a 3D artifact.
///
/// Implementations may take arbitrarily long and may fail or even panic;
/// the dispatcher converts every such fault into [`Outcome::Failure`].
pub trait Reconstructor: Send + Sync + 'static {
    fn reconstruct(
        &self,
        job_id: JobId,
        inputs: Vec<PathBuf>,
    ) -> impl Future<Output = Result<PathBuf, ReconstructionError>> + Send;

    /// Drop any scratch files kept for `job_id`. Called once the job's
    /// outcome has been recorded, whatever it was.
    fn discard(&self, job_id: JobId) -> impl Future<Output = ()> + Send {
        let _ = job_id;
        async {}
    }
}

impl From<Result<PathBuf, ReconstructionError>> for Outcome {
    fn from(result: Result<PathBuf, ReconstructionError>) -> Self {
        match result {
            Ok(path) => Self::Success(path),
            Err(e) => Self::Failure(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_no_input() {
        assert_eq!(ReconstructionError::NoInput.to_string(), "no usable input");
    }

    #[test]
    fn display_model_unavailable() {
        let err = ReconstructionError::ModelUnavailable("sample.glb".into());
        assert_eq!(err.to_string(), "sample.glb not found on server");
    }

    #[test]
    fn error_converts_to_failure_outcome() {
        let outcome: Outcome = Err::<PathBuf, _>(ReconstructionError::NoInput).into();
        assert_eq!(outcome, Outcome::Failure("no usable input".into()));
    }
}
