use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CoreError;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Opaque job identifier.
///
/// Serializes as the hyphenated UUID string. Because it is always a valid
/// UUID it is also safe to use as a single path segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(Uuid);

impl JobId {
    /// Allocate a fresh random id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.hyphenated().fmt(f)
    }
}

impl FromStr for JobId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|_| CoreError::InvalidJobId(s.to_string()))
    }
}

/// One uploaded image, as decoded by the transport adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputFile {
    /// Client-supplied file name, used only to pick an extension.
    pub original_name: Option<String>,
    pub bytes: Vec<u8>,
}

impl InputFile {
    pub fn new(original_name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            original_name: Some(original_name.into()),
            bytes: bytes.into(),
        }
    }

    pub fn unnamed(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            original_name: None,
            bytes: bytes.into(),
        }
    }
}
