//! Durable storage for job records and per-job file namespaces.
//!
//! [`JobStorage`] is the contract the job manager relies on; [`LocalStorage`]
//! implements it on a local filesystem directory.

use std::future::Future;
use std::path::{Path, PathBuf};

use carscan_core::job::JobRecord;
use carscan_core::types::{InputFile, JobId};

pub mod error;
pub mod local;

pub use error::StorageError;
pub use local::LocalStorage;

/// URL path prefix under which published artifacts are served.
pub const ARTIFACT_ROUTE_PREFIX: &str = "/scans";

/// Persistence of job records and their input/output files.
///
/// Record writes replace the whole record atomically: a concurrent
/// [`read_record`](JobStorage::read_record) sees either the previous or
/// the new record, never a mix.
pub trait JobStorage: Send + Sync + 'static {
    /// Allocate the input and output areas for a new job.
    ///
    /// Fails with [`StorageError::AlreadyExists`] if the namespace exists.
    fn create_namespace(&self, id: JobId) -> impl Future<Output = Result<(), StorageError>> + Send;

    /// Persist `files` in order under canonical sequential names.
    ///
    /// Returns the stored file names in submission order.
    fn write_inputs(
        &self,
        id: JobId,
        files: &[InputFile],
    ) -> impl Future<Output = Result<Vec<String>, StorageError>> + Send;

    /// Paths of the stored inputs, in submission order.
    fn list_inputs(&self, id: JobId) -> impl Future<Output = Result<Vec<PathBuf>, StorageError>> + Send;

    /// Fails with [`StorageError::NotFound`] if no record exists for `id`.
    fn read_record(&self, id: JobId) -> impl Future<Output = Result<JobRecord, StorageError>> + Send;

    /// Atomically create or replace the record for `record.id()`.
    fn write_record(&self, record: &JobRecord) -> impl Future<Output = Result<(), StorageError>> + Send;

    /// Every readable record. Unreadable entries are skipped.
    fn list_records(&self) -> impl Future<Output = Result<Vec<JobRecord>, StorageError>> + Send;

    /// Copy the artifact at `source` into the job's output slot and return
    /// its externally reachable address.
    fn publish_artifact(
        &self,
        id: JobId,
        source: &Path,
    ) -> impl Future<Output = Result<String, StorageError>> + Send;

    /// Remove a namespace entirely. Missing namespaces are not an error.
    fn remove_namespace(&self, id: JobId) -> impl Future<Output = Result<(), StorageError>> + Send;
}
