use std::path::PathBuf;
use std::time::Duration;

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Root directory for job namespaces (default: `scans`).
    pub scans_dir: PathBuf,
    /// Scratch directory for the reconstructor (default: `work`).
    pub work_dir: PathBuf,
    /// Origin used to build artifact URLs handed to clients.
    pub public_base_url: String,
    /// Model returned by the stand-in reconstructor (default: `sample.glb`).
    pub sample_model_path: PathBuf,
    /// Simulated reconstruction time in seconds (default: `10`).
    pub processing_delay_secs: u64,
    /// Reconstructions allowed to run concurrently (default: `4`).
    pub max_concurrent_jobs: usize,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Time allowed for in-flight jobs to finish on shutdown (default: `30`).
    pub shutdown_timeout_secs: u64,
    /// Maximum accepted upload body size in bytes (default: 256 MiB).
    pub max_upload_bytes: usize,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                 | Default                                   |
    /// |-------------------------|-------------------------------------------|
    /// | `HOST`                  | `0.0.0.0`                                 |
    /// | `PORT`                  | `3000`                                    |
    /// | `SCANS_DIR`             | `scans`                                   |
    /// | `WORK_DIR`              | `work`                                    |
    /// | `PUBLIC_BASE_URL`       | `RENDER_EXTERNAL_URL` or `http://localhost:{PORT}` |
    /// | `SAMPLE_MODEL_PATH`     | `sample.glb`                              |
    /// | `PROCESSING_DELAY_SECS` | `10`                                      |
    /// | `MAX_CONCURRENT_JOBS`   | `4`                                       |
    /// | `CORS_ORIGINS`          | `http://localhost:5173`                   |
    /// | `REQUEST_TIMEOUT_SECS`  | `30`                                      |
    /// | `SHUTDOWN_TIMEOUT_SECS` | `30`                                      |
    /// | `MAX_UPLOAD_BYTES`      | `268435456`                               |
    ///
    /// Panics on unparsable values so misconfiguration fails at startup.
    pub fn from_env() -> Self {
        let host = env_or("HOST", "0.0.0.0");
        let port: u16 = parse_env("PORT", "3000");

        let public_base_url = std::env::var("PUBLIC_BASE_URL")
            .or_else(|_| std::env::var("RENDER_EXTERNAL_URL"))
            .unwrap_or_else(|_| format!("http://localhost:{port}"));

        let cors_origins: Vec<String> = env_or("CORS_ORIGINS", "http://localhost:5173")
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Self {
            host,
            port,
            scans_dir: env_or("SCANS_DIR", "scans").into(),
            work_dir: env_or("WORK_DIR", "work").into(),
            public_base_url,
            sample_model_path: env_or("SAMPLE_MODEL_PATH", "sample.glb").into(),
            processing_delay_secs: parse_env("PROCESSING_DELAY_SECS", "10"),
            max_concurrent_jobs: parse_env("MAX_CONCURRENT_JOBS", "4"),
            cors_origins,
            request_timeout_secs: parse_env("REQUEST_TIMEOUT_SECS", "30"),
            shutdown_timeout_secs: parse_env("SHUTDOWN_TIMEOUT_SECS", "30"),
            max_upload_bytes: parse_env("MAX_UPLOAD_BYTES", "268435456"),
        }
    }

    pub fn processing_delay(&self) -> Duration {
        Duration::from_secs(self.processing_delay_secs)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.into())
}

fn parse_env<T>(key: &str, default: &str) -> T
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    env_or(key, default)
        .parse()
        .unwrap_or_else(|e| panic!("{key} must be a valid {}: {e}", std::any::type_name::<T>()))
}
