use carscan_core::error::CoreError;
use carscan_core::types::JobId;
use carscan_storage::StorageError;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Namespace or record creation failed; nothing is visible for `id`.
    #[error("Submission of job {id} failed: {source}")]
    Submission {
        id: JobId,
        #[source]
        source: StorageError,
    },

    /// The submission task died before reporting; the job may be partial.
    #[error("Submission of job {0} was interrupted")]
    SubmissionInterrupted(JobId),

    #[error("Job {0} not found")]
    NotFound(JobId),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Core(#[from] CoreError),
}
