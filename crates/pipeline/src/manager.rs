//! Job manager: submission, status queries, and terminal transitions.
//!
//! Mutation paths into a job record:
//!
//! 1. [`JobManager::submit`] writes the initial `processing` record.
//! 2. [`JobManager::complete_processing`] applies the one terminal
//!    transition, invoked by the dispatcher when the work finishes.
//!
//! Both run under the job's lock from [`JobLocks`]. Status reads take no
//! lock and rely on the store's atomic record replacement.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use carscan_core::job::{JobRecord, JobStatus};
use carscan_core::types::{InputFile, JobId};
use carscan_storage::{JobStorage, StorageError};

use crate::dispatcher::{Dispatcher, DEFAULT_MAX_CONCURRENT_JOBS};
use crate::error::PipelineError;
use crate::locks::JobLocks;
use crate::reconstruct::{Outcome, Reconstructor};

/// Reason recorded for jobs whose processing died with a previous process.
pub const INTERRUPTED_REASON: &str = "processing interrupted by server restart";

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Retry policy for storage operations on the terminal-transition path.
///
/// Only I/O failures are retried. The delay doubles after each attempt.
#[derive(Debug, Clone, Copy)]
pub struct RecordWriteRetry {
    pub attempts: u32,
    pub initial_delay: Duration,
}

impl Default for RecordWriteRetry {
    fn default() -> Self {
        Self {
            attempts: 3,
            initial_delay: Duration::from_millis(50),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ManagerConfig {
    pub max_concurrent_jobs: usize,
    pub retry: RecordWriteRetry,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_jobs: DEFAULT_MAX_CONCURRENT_JOBS,
            retry: RecordWriteRetry::default(),
        }
    }
}

/// What [`JobManager::complete_processing`] did with an outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionResult {
    /// The record moved to the given terminal status.
    Applied(JobStatus),
    /// The record was already terminal; the outcome was dropped.
    AlreadyTerminal(JobStatus),
    /// No record exists any more; the outcome was dropped.
    JobMissing,
}

// ---------------------------------------------------------------------------
// JobManager
// ---------------------------------------------------------------------------

struct Inner<S, R> {
    storage: S,
    reconstructor: Arc<R>,
    locks: JobLocks,
    dispatcher: Dispatcher,
    retry: RecordWriteRetry,
}

/// Owns the lifecycle of every job. Cheap to clone.
pub struct JobManager<S, R> {
    inner: Arc<Inner<S, R>>,
}

impl<S, R> Clone for JobManager<S, R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S, R> JobManager<S, R>
where
    S: JobStorage,
    R: Reconstructor,
{
    pub fn new(storage: S, reconstructor: R, config: ManagerConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                storage,
                reconstructor: Arc::new(reconstructor),
                locks: JobLocks::new(),
                dispatcher: Dispatcher::new(config.max_concurrent_jobs),
                retry: config.retry,
            }),
        }
    }

    pub fn storage(&self) -> &S {
        &self.inner.storage
    }

    pub fn reconstructor(&self) -> Arc<R> {
        Arc::clone(&self.inner.reconstructor)
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.inner.dispatcher
    }

    // -----------------------------------------------------------------------
    // Submit
    // -----------------------------------------------------------------------

    /// Create a job for `files` and start processing it in the background.
    ///
    /// Returns as soon as the initial record is durable. On failure the
    /// partially created namespace is removed and no job is visible.
    ///
    /// The work runs on its own task, so dropping the returned future (a
    /// disconnected client, a request timeout) never leaves a half-created
    /// namespace or an undispatched record behind.
    pub async fn submit(&self, files: Vec<InputFile>) -> Result<JobId, PipelineError> {
        let id = JobId::new();
        let manager = self.clone();
        let task = self
            .inner
            .dispatcher
            .spawn_tracked(async move { manager.create_and_dispatch(id, files).await });

        match task.await {
            Ok(result) => result,
            Err(join_err) if join_err.is_panic() => std::panic::resume_unwind(join_err.into_panic()),
            Err(join_err) => {
                tracing::error!(job_id = %id, error = %join_err, "Job submission task aborted");
                Err(PipelineError::SubmissionInterrupted(id))
            }
        }
    }

    async fn create_and_dispatch(&self, id: JobId, files: Vec<InputFile>) -> Result<JobId, PipelineError> {
        {
            let _guard = self.inner.locks.lock(id).await;
            if let Err(source) = self.create_job(id, &files).await {
                tracing::error!(job_id = %id, error = %source, "Job submission failed");
                if !matches!(source, StorageError::AlreadyExists(_)) {
                    self.discard_namespace(id).await;
                }
                return Err(PipelineError::Submission { id, source });
            }
        }

        tracing::info!(job_id = %id, inputs = files.len(), "Job submitted");
        self.inner.dispatcher.dispatch(self.clone(), id);
        Ok(id)
    }

    async fn create_job(&self, id: JobId, files: &[InputFile]) -> Result<(), StorageError> {
        let storage = &self.inner.storage;
        storage.create_namespace(id).await?;
        storage.write_inputs(id, files).await?;
        storage.write_record(&JobRecord::new(id)).await
    }

    async fn discard_namespace(&self, id: JobId) {
        if let Err(e) = self.inner.storage.remove_namespace(id).await {
            // Without a record the leftover namespace is never reported.
            tracing::warn!(job_id = %id, error = %e, "Failed to remove partial namespace");
        }
    }

    // -----------------------------------------------------------------------
    // Status
    // -----------------------------------------------------------------------

    /// Current persisted record for `id`. Never waits on processing.
    pub async fn get_status(&self, id: JobId) -> Result<JobRecord, PipelineError> {
        self.inner.storage.read_record(id).await.map_err(|e| match e {
            StorageError::NotFound(id) => PipelineError::NotFound(id),
            other => PipelineError::Storage(other),
        })
    }

    // -----------------------------------------------------------------------
    // Completion
    // -----------------------------------------------------------------------

    /// Apply the outcome of processing to the job's record.
    ///
    /// Only the first outcome for a job takes effect. Outcomes for terminal
    /// or missing records are dropped without error. A successful outcome
    /// whose artifact cannot be published marks the job `failed`.
    pub async fn complete_processing(
        &self,
        id: JobId,
        outcome: Outcome,
    ) -> Result<CompletionResult, PipelineError> {
        let storage = &self.inner.storage;
        let _guard = self.inner.locks.lock(id).await;

        let mut record = match self.with_retry(id, || storage.read_record(id)).await {
            Ok(record) => record,
            Err(StorageError::NotFound(_)) => {
                tracing::debug!(job_id = %id, "Dropping outcome for missing job");
                return Ok(CompletionResult::JobMissing);
            }
            Err(e) => return Err(e.into()),
        };

        if record.is_terminal() {
            tracing::warn!(
                job_id = %id,
                status = %record.status(),
                "Ignoring outcome for job already in a terminal state",
            );
            return Ok(CompletionResult::AlreadyTerminal(record.status()));
        }

        match outcome {
            Outcome::Success(source) => {
                match self.with_retry(id, || storage.publish_artifact(id, &source)).await {
                    Ok(url) => record.complete(url)?,
                    Err(e) => {
                        tracing::warn!(job_id = %id, error = %e, "Artifact publication failed");
                        record.fail(format!("failed to publish artifact: {e}"))?;
                    }
                }
            }
            Outcome::Failure(reason) => record.fail(reason)?,
        }

        self.with_retry(id, || storage.write_record(&record)).await?;

        match record.status() {
            JobStatus::Failed => tracing::info!(
                job_id = %id,
                error = record.error().unwrap_or_default(),
                "Job failed",
            ),
            status => tracing::info!(
                job_id = %id,
                status = %status,
                result_url = record.result_url().unwrap_or_default(),
                "Job finished",
            ),
        }
        Ok(CompletionResult::Applied(record.status()))
    }

    async fn with_retry<T, F, Fut>(&self, id: JobId, mut op: F) -> Result<T, StorageError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, StorageError>>,
    {
        let policy = self.inner.retry;
        let mut delay = policy.initial_delay;
        let mut attempt = 1;
        loop {
            match op().await {
                Err(e @ StorageError::Io { .. }) if attempt < policy.attempts => {
                    tracing::warn!(job_id = %id, attempt, error = %e, "Storage operation failed, retrying");
                    tokio::time::sleep(delay).await;
                    delay *= 2;
                    attempt += 1;
                }
                result => return result,
            }
        }
    }

    // -----------------------------------------------------------------------
    // Recovery and shutdown
    // -----------------------------------------------------------------------

    /// Fail every job left in `processing` by a previous process.
    ///
    /// Their dispatches died with that process, so nothing would ever
    /// complete them. Must run before new submissions are accepted.
    /// Returns the number of jobs transitioned.
    pub async fn recover_interrupted(&self) -> Result<usize, PipelineError> {
        let records = self.inner.storage.list_records().await?;
        let mut recovered = 0;

        for record in records.iter().filter(|r| r.status() == JobStatus::Processing) {
            let id = record.id();
            match self
                .complete_processing(id, Outcome::Failure(INTERRUPTED_REASON.into()))
                .await
            {
                Ok(CompletionResult::Applied(_)) => recovered += 1,
                Ok(_) => {}
                Err(e) => {
                    tracing::error!(job_id = %id, error = %e, "Failed to recover interrupted job");
                }
            }
        }

        if recovered > 0 {
            tracing::warn!(recovered, "Marked interrupted jobs as failed");
        }
        Ok(recovered)
    }

    /// Wait up to `timeout` for in-flight submissions and jobs.
    ///
    /// Jobs dispatched after this call fail straight away with
    /// [`SHUTDOWN_REASON`](crate::dispatcher::SHUTDOWN_REASON).
    pub async fn shutdown(&self, timeout: Duration) -> bool {
        self.inner.dispatcher.shutdown(timeout).await
    }
}
