//! Shared fixtures for job manager integration tests.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use carscan_core::job::JobRecord;
use carscan_core::types::{InputFile, JobId};
use carscan_pipeline::{JobManager, ManagerConfig, ReconstructionError, Reconstructor};
use carscan_storage::LocalStorage;
use tokio::sync::Semaphore;

pub const BASE_URL: &str = "http://localhost:3000";

/// Input content that makes [`ScriptedReconstructor`] panic.
pub const PANIC_INPUT: &[u8] = b"panic";

/// Input content that makes [`ScriptedReconstructor`] fail.
pub const FAIL_INPUT: &[u8] = b"fail";

/// Input content that makes [`ScriptedReconstructor`] return a missing artifact.
pub const MISSING_ARTIFACT_INPUT: &[u8] = b"vanish";

/// Reconstructor whose behaviour is chosen by the first input's bytes.
///
/// Holds every job until a permit is released on its gate, so tests can
/// observe the `processing` state deterministically.
pub struct ScriptedReconstructor {
    artifact: PathBuf,
    gate: Arc<Semaphore>,
}

impl Reconstructor for ScriptedReconstructor {
    async fn reconstruct(&self, _job_id: JobId, inputs: Vec<PathBuf>) -> Result<PathBuf, ReconstructionError> {
        if let Ok(permit) = self.gate.acquire().await {
            permit.forget();
        }

        let first = match inputs.first() {
            Some(path) => tokio::fs::read(path)
                .await
                .map_err(|e| ReconstructionError::Failed(e.to_string()))?,
            None => return Err(ReconstructionError::NoInput),
        };

        match first.as_slice() {
            PANIC_INPUT => panic!("reconstructor exploded"),
            FAIL_INPUT => Err(ReconstructionError::Failed("unusable images".into())),
            MISSING_ARTIFACT_INPUT => Ok(self.artifact.with_file_name("does-not-exist.glb")),
            _ => Ok(self.artifact.clone()),
        }
    }
}

pub struct Harness {
    pub dir: tempfile::TempDir,
    pub manager: JobManager<LocalStorage, ScriptedReconstructor>,
    pub gate: Arc<Semaphore>,
}

impl Harness {
    /// Manager over a fresh temp directory. Jobs run immediately.
    pub fn open() -> Self {
        let harness = Self::gated();
        harness.gate.add_permits(Semaphore::MAX_PERMITS / 2);
        harness
    }

    /// Manager whose jobs wait for [`Harness::release`].
    pub fn gated() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let artifact = dir.path().join("car_scan.glb");
        std::fs::write(&artifact, b"glTF").unwrap();

        let gate = Arc::new(Semaphore::new(0));
        let storage = LocalStorage::new(dir.path().join("scans"), BASE_URL);
        let reconstructor = ScriptedReconstructor {
            artifact,
            gate: Arc::clone(&gate),
        };
        let manager = JobManager::new(storage, reconstructor, ManagerConfig::default());
        Self { dir, manager, gate }
    }

    pub fn release(&self, jobs: usize) {
        self.gate.add_permits(jobs);
    }

    /// Poll until the job is terminal, panicking after five seconds.
    pub async fn wait_terminal(&self, id: JobId) -> JobRecord {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        loop {
            let record = self.manager.get_status(id).await.unwrap();
            if record.is_terminal() {
                return record;
            }
            assert!(
                tokio::time::Instant::now() < deadline,
                "job {id} did not reach a terminal state"
            );
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }
}

pub fn images(contents: &[&[u8]]) -> Vec<InputFile> {
    contents
        .iter()
        .enumerate()
        .map(|(i, bytes)| InputFile::new(format!("photo_{i}.jpg"), bytes.to_vec()))
        .collect()
}
