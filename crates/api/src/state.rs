use carscan_pipeline::{JobManager, ManagerConfig, SampleReconstructor};
use carscan_storage::LocalStorage;

use crate::config::ServerConfig;

/// Job manager as wired for this service.
pub type ScanJobs = JobManager<LocalStorage, SampleReconstructor>;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable (the job manager is behind an `Arc`).
#[derive(Clone)]
pub struct AppState {
    pub jobs: ScanJobs,
}

impl AppState {
    /// Wire storage, reconstructor, and job manager from configuration.
    pub fn from_config(config: &ServerConfig) -> Self {
        let storage = LocalStorage::new(&config.scans_dir, &config.public_base_url);
        let reconstructor = SampleReconstructor::new(
            &config.sample_model_path,
            &config.work_dir,
            config.processing_delay(),
        );
        let manager_config = ManagerConfig {
            max_concurrent_jobs: config.max_concurrent_jobs,
            ..ManagerConfig::default()
        };

        Self {
            jobs: JobManager::new(storage, reconstructor, manager_config),
        }
    }
}
