//! Per-job mutual exclusion.
//!
//! Every mutation of a job record happens while holding that job's lock.
//! Locks are created on demand and dropped once nobody holds them, so the
//! registry only ever contains jobs with a writer in flight.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, Weak};

use carscan_core::types::JobId;
use tokio::sync::OwnedMutexGuard;

type JobLock = tokio::sync::Mutex<()>;

/// Registry of async locks keyed by job id.
///
/// The registry's own mutex guards only the map lookup; it is never held
/// across an `.await`, and no lock covers more than one job.
#[derive(Debug, Default)]
pub struct JobLocks {
    entries: Mutex<HashMap<JobId, Weak<JobLock>>>,
}

impl JobLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `id`. Released when the guard drops.
    pub async fn lock(&self, id: JobId) -> OwnedMutexGuard<()> {
        self.entry(id).lock_owned().await
    }

    fn entry(&self, id: JobId) -> Arc<JobLock> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(lock) = entries.get(&id).and_then(Weak::upgrade) {
            return lock;
        }
        entries.retain(|_, lock| lock.strong_count() > 0);
        let lock = Arc::new(JobLock::new(()));
        entries.insert(id, Arc::downgrade(&lock));
        lock
    }
}
