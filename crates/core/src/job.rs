//! Job record and its lifecycle state machine.
//!
//! A record starts in [`JobStatus::Processing`] and moves exactly once to
//! [`JobStatus::Done`] or [`JobStatus::Failed`]. The only ways to change a
//! record are [`JobRecord::complete`] and [`JobRecord::fail`], so a record
//! held in memory always satisfies the terminal-field invariant. Records
//! read back from storage are checked with [`JobRecord::validate`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{JobId, Timestamp};

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Lifecycle status of a reconstruction job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Processing,
    Done,
    Failed,
}

impl JobStatus {
    /// `done` and `failed` are terminal: no transition leaves them.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    /// Wire name, identical to the serialized form.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Processing => "processing",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// The durable status document for a single job.
///
/// Serializes with camelCase keys and explicit `null`s:
///
/// ```json
/// {"id":"…","status":"processing","createdAt":"…","error":null,"resultUrl":null}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRecord {
    id: JobId,
    status: JobStatus,
    created_at: Timestamp,
    error: Option<String>,
    result_url: Option<String>,
}

impl JobRecord {
    /// A fresh record in `processing`, stamped with the current time.
    pub fn new(id: JobId) -> Self {
        Self::with_created_at(id, chrono::Utc::now())
    }

    pub fn with_created_at(id: JobId, created_at: Timestamp) -> Self {
        Self {
            id,
            status: JobStatus::Processing,
            created_at,
            error: None,
            result_url: None,
        }
    }

    pub fn id(&self) -> JobId {
        self.id
    }

    pub fn status(&self) -> JobStatus {
        self.status
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn result_url(&self) -> Option<&str> {
        self.result_url.as_deref()
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Transition `processing -> done` with the published artifact address.
    pub fn complete(&mut self, result_url: impl Into<String>) -> Result<(), CoreError> {
        self.ensure_processing(JobStatus::Done)?;
        self.status = JobStatus::Done;
        self.result_url = Some(result_url.into());
        self.error = None;
        Ok(())
    }

    /// Transition `processing -> failed` with a human-readable reason.
    pub fn fail(&mut self, reason: impl Into<String>) -> Result<(), CoreError> {
        self.ensure_processing(JobStatus::Failed)?;
        self.status = JobStatus::Failed;
        self.error = Some(reason.into());
        self.result_url = None;
        Ok(())
    }

    fn ensure_processing(&self, to: JobStatus) -> Result<(), CoreError> {
        if self.status == JobStatus::Processing {
            Ok(())
        } else {
            Err(CoreError::InvalidTransition {
                id: self.id,
                from: self.status,
                to,
            })
        }
    }

    /// Check the status/field invariant on a record that was deserialized
    /// rather than built through the transition methods.
    ///
    /// - `processing`: `error` and `resultUrl` are both null
    /// - `done`: `resultUrl` set, `error` null
    /// - `failed`: `error` set, `resultUrl` null
    pub fn validate(&self) -> Result<(), CoreError> {
        let consistent = match self.status {
            JobStatus::Processing => self.error.is_none() && self.result_url.is_none(),
            JobStatus::Done => self.error.is_none() && self.result_url.is_some(),
            JobStatus::Failed => self.error.is_some() && self.result_url.is_none(),
        };
        if consistent {
            Ok(())
        } else {
            Err(CoreError::InvalidRecord {
                id: self.id,
                reason: format!(
                    "status '{}' with error={:?} resultUrl={:?}",
                    self.status, self.error, self.result_url
                ),
            })
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
