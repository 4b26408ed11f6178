use crate::job::JobStatus;
use crate::types::JobId;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoreError {
    #[error("Invalid transition for job {id}: {from} -> {to}")]
    InvalidTransition {
        id: JobId,
        from: JobStatus,
        to: JobStatus,
    },

    #[error("Invalid record for job {id}: {reason}")]
    InvalidRecord { id: JobId, reason: String },

    #[error("Invalid job id '{0}'")]
    InvalidJobId(String),
}
