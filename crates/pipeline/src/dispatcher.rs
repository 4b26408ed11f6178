//! Bounded worker pool that runs reconstructions off the request path.
//!
//! Each dispatched job becomes one tracked Tokio task. The task waits for a
//! pool permit, runs the reconstructor in a nested task so a panic is
//! contained, and always reports exactly one [`Outcome`] back through
//! [`JobManager::complete_processing`].

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use carscan_core::types::JobId;
use carscan_storage::JobStorage;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio_util::task::TaskTracker;

use crate::manager::JobManager;
use crate::reconstruct::{Outcome, Reconstructor};

/// Default number of reconstructions allowed to run at once.
pub const DEFAULT_MAX_CONCURRENT_JOBS: usize = 4;

/// Reason recorded when the reconstructor panics.
pub const PANIC_REASON: &str = "reconstruction worker panicked";

/// Reason recorded for jobs dispatched after shutdown began.
pub const SHUTDOWN_REASON: &str = "server shutting down";

#[derive(Debug, Clone)]
pub struct Dispatcher {
    permits: Arc<Semaphore>,
    tracker: TaskTracker,
}

impl Dispatcher {
    pub fn new(max_concurrent_jobs: usize) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(max_concurrent_jobs.max(1))),
            tracker: TaskTracker::new(),
        }
    }

    /// Start processing `job_id` in the background. Returns immediately.
    ///
    /// Once [`shutdown`](Self::shutdown) has been called the job is not
    /// reconstructed; it is failed with [`SHUTDOWN_REASON`] instead.
    pub fn dispatch<S, R>(&self, manager: JobManager<S, R>, job_id: JobId)
    where
        S: JobStorage,
        R: Reconstructor,
    {
        let permits = Arc::clone(&self.permits);
        let closing = self.tracker.is_closed();
        self.tracker.spawn(async move {
            let outcome = if closing {
                tracing::warn!(job_id = %job_id, "Job dispatched during shutdown");
                Outcome::Failure(SHUTDOWN_REASON.into())
            } else {
                match permits.acquire_owned().await {
                    Ok(_permit) => run_reconstruction(&manager, job_id).await,
                    Err(_) => Outcome::Failure("worker pool closed".into()),
                }
            };

            if let Err(e) = manager.complete_processing(job_id, outcome).await {
                // The record stays `processing` until the next startup recovery.
                tracing::error!(job_id = %job_id, error = %e, "Failed to record job outcome");
            }
            manager.reconstructor().discard(job_id).await;
        });
        tracing::debug!(job_id = %job_id, in_flight = self.tracker.len(), "Job dispatched");
    }

    /// Run `task` on the tracker so [`shutdown`](Self::shutdown) waits for it.
    pub(crate) fn spawn_tracked<F>(&self, task: F) -> JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        self.tracker.spawn(task)
    }

    /// Number of tracked tasks (submissions and jobs) still running.
    pub fn in_flight(&self) -> usize {
        self.tracker.len()
    }

    /// Close the pool and wait up to `timeout` for tracked tasks to finish.
    ///
    /// Tasks still running after the timeout keep running; their jobs are
    /// failed by startup recovery if the process exits first. Returns
    /// `true` if everything drained in time.
    pub async fn shutdown(&self, timeout: Duration) -> bool {
        self.tracker.close();
        let remaining = self.tracker.len();
        if remaining > 0 {
            tracing::info!(remaining, "Waiting for in-flight jobs");
        }
        tokio::time::timeout(timeout, self.tracker.wait()).await.is_ok()
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CONCURRENT_JOBS)
    }
}

/// Run the reconstructor for one job, converting every fault to a failure.
async fn run_reconstruction<S, R>(manager: &JobManager<S, R>, job_id: JobId) -> Outcome
where
    S: JobStorage,
    R: Reconstructor,
{
    let inputs = match manager.storage().list_inputs(job_id).await {
        Ok(inputs) => inputs,
        Err(e) => {
            tracing::warn!(job_id = %job_id, error = %e, "Failed to list job inputs");
            return Outcome::Failure(format!("failed to read inputs: {e}"));
        }
    };

    tracing::info!(job_id = %job_id, inputs = inputs.len(), "Reconstruction started");
    let reconstructor = manager.reconstructor();
    let task = tokio::spawn(async move { reconstructor.reconstruct(job_id, inputs).await });

    match task.await {
        Ok(result) => {
            if let Err(e) = &result {
                tracing::warn!(job_id = %job_id, error = %e, "Reconstruction failed");
            }
            result.into()
        }
        Err(join_err) if join_err.is_panic() => {
            tracing::error!(job_id = %job_id, "Reconstruction worker panicked");
            Outcome::Failure(PANIC_REASON.into())
        }
        Err(join_err) => {
            tracing::error!(job_id = %job_id, error = %join_err, "Reconstruction task aborted");
            Outcome::Failure(format!("reconstruction task aborted: {join_err}"))
        }
    }
}
