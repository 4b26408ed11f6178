use std::path::PathBuf;

use carscan_core::error::CoreError;
use carscan_core::types::JobId;

/// Failures of the durable job store.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("No record for job {0}")]
    NotFound(JobId),

    #[error("Namespace for job {0} already exists")]
    AlreadyExists(JobId),

    #[error("Artifact not found at {}", .0.display())]
    ArtifactMissing(PathBuf),

    #[error("I/O error while {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed record for job {id}: {source}")]
    Serialization {
        id: JobId,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Corrupt(#[from] CoreError),
}

impl StorageError {
    pub(crate) fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }
}
