//! Filesystem implementation of [`JobStorage`].
//!
//! Layout under the storage root:
//!
//! ```text
//! {root}/{job_id}/job.json
//! {root}/{job_id}/input/item_001.jpg
//! {root}/{job_id}/output/{artifact}
//! ```
//!
//! `job.json` is the visibility gate: a namespace without a record is an
//! abandoned submission and is never reported as a job.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use carscan_core::job::JobRecord;
use carscan_core::naming::{self, INPUT_PREFIX};
use carscan_core::types::{InputFile, JobId};
use tokio::io::AsyncWriteExt;

use crate::error::StorageError;
use crate::{JobStorage, ARTIFACT_ROUTE_PREFIX};

/// Record file name inside a job namespace.
pub const RECORD_FILE: &str = "job.json";

/// Input collection directory inside a job namespace.
pub const INPUT_DIR: &str = "input";

/// Output slot directory inside a job namespace.
pub const OUTPUT_DIR: &str = "output";

/// Suffix for files being written before their atomic rename.
const PARTIAL_SUFFIX: &str = ".partial";

/// Artifact name used when the source path has no file name.
const DEFAULT_ARTIFACT_NAME: &str = "artifact.bin";

/// Job store rooted at a local directory.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root: PathBuf,
    public_base_url: String,
}

impl LocalStorage {
    /// `public_base_url` is the origin clients use to reach published
    /// artifacts, e.g. `http://localhost:3000`. A trailing slash is ignored.
    pub fn new(root: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        let public_base_url = public_base_url.into().trim_end_matches('/').to_string();
        Self {
            root: root.into(),
            public_base_url,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn public_base_url(&self) -> &str {
        &self.public_base_url
    }

    /// Directory holding everything that belongs to `id`.
    pub fn namespace_dir(&self, id: JobId) -> PathBuf {
        self.root.join(id.to_string())
    }

    fn record_path(&self, id: JobId) -> PathBuf {
        self.namespace_dir(id).join(RECORD_FILE)
    }

    fn input_dir(&self, id: JobId) -> PathBuf {
        self.namespace_dir(id).join(INPUT_DIR)
    }

    fn output_dir(&self, id: JobId) -> PathBuf {
        self.namespace_dir(id).join(OUTPUT_DIR)
    }

    /// External address of an artifact file in the output slot of `id`.
    pub fn artifact_url(&self, id: JobId, file_name: &str) -> String {
        format!(
            "{}{ARTIFACT_ROUTE_PREFIX}/{id}/{OUTPUT_DIR}/{file_name}",
            self.public_base_url
        )
    }
}

impl JobStorage for LocalStorage {
    async fn create_namespace(&self, id: JobId) -> Result<(), StorageError> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| StorageError::io(format!("creating storage root {}", self.root.display()), e))?;

        let dir = self.namespace_dir(id);
        match tokio::fs::create_dir(&dir).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(StorageError::AlreadyExists(id));
            }
            Err(e) => {
                return Err(StorageError::io(format!("creating namespace {}", dir.display()), e));
            }
        }

        for sub in [self.input_dir(id), self.output_dir(id)] {
            tokio::fs::create_dir(&sub)
                .await
                .map_err(|e| StorageError::io(format!("creating {}", sub.display()), e))?;
        }

        tracing::debug!(job_id = %id, path = %dir.display(), "Namespace created");
        Ok(())
    }

    async fn write_inputs(&self, id: JobId, files: &[InputFile]) -> Result<Vec<String>, StorageError> {
        let dir = self.input_dir(id);
        let mut names = Vec::with_capacity(files.len());

        for (index, file) in files.iter().enumerate() {
            let name = naming::input_file_name(index, file.original_name.as_deref());
            write_synced(&dir.join(&name), &file.bytes).await?;
            names.push(name);
        }

        tracing::debug!(job_id = %id, count = names.len(), "Inputs written");
        Ok(names)
    }

    async fn list_inputs(&self, id: JobId) -> Result<Vec<PathBuf>, StorageError> {
        let dir = self.input_dir(id);
        let mut entries = tokio::fs::read_dir(&dir)
            .await
            .map_err(|e| StorageError::io(format!("listing {}", dir.display()), e))?;

        let mut inputs = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StorageError::io(format!("listing {}", dir.display()), e))?
        {
            let name = entry.file_name().to_string_lossy().into_owned();
            if let Some(seq) = input_sequence(&name) {
                inputs.push((seq, entry.path()));
            }
        }

        inputs.sort_by_key(|(seq, _)| *seq);
        Ok(inputs.into_iter().map(|(_, path)| path).collect())
    }

    async fn read_record(&self, id: JobId) -> Result<JobRecord, StorageError> {
        let path = self.record_path(id);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(StorageError::NotFound(id)),
            Err(e) => return Err(StorageError::io(format!("reading {}", path.display()), e)),
        };

        let record: JobRecord = serde_json::from_slice(&bytes)
            .map_err(|source| StorageError::Serialization { id, source })?;
        record.validate()?;
        Ok(record)
    }

    async fn write_record(&self, record: &JobRecord) -> Result<(), StorageError> {
        let id = record.id();
        let bytes = serde_json::to_vec_pretty(record)
            .map_err(|source| StorageError::Serialization { id, source })?;
        write_atomic(&self.record_path(id), &bytes).await?;
        tracing::debug!(job_id = %id, status = %record.status(), "Record written");
        Ok(())
    }

    async fn list_records(&self) -> Result<Vec<JobRecord>, StorageError> {
        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(StorageError::io(format!("listing {}", self.root.display()), e));
            }
        };

        let mut records = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StorageError::io(format!("listing {}", self.root.display()), e))?
        {
            let Ok(id) = entry.file_name().to_string_lossy().parse::<JobId>() else {
                continue;
            };
            match self.read_record(id).await {
                Ok(record) => records.push(record),
                Err(StorageError::NotFound(_)) => {
                    tracing::debug!(job_id = %id, "Skipping namespace without a record");
                }
                Err(e) => {
                    tracing::warn!(job_id = %id, error = %e, "Skipping unreadable record");
                }
            }
        }

        Ok(records)
    }

    async fn publish_artifact(&self, id: JobId, source: &Path) -> Result<String, StorageError> {
        let exists = tokio::fs::try_exists(source)
            .await
            .map_err(|e| StorageError::io(format!("checking {}", source.display()), e))?;
        if !exists {
            return Err(StorageError::ArtifactMissing(source.to_path_buf()));
        }

        let file_name = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| DEFAULT_ARTIFACT_NAME.to_string());
        let target = self.output_dir(id).join(&file_name);
        let partial = partial_path(&target);

        tokio::fs::copy(source, &partial)
            .await
            .map_err(|e| StorageError::io(format!("copying artifact to {}", partial.display()), e))?;
        tokio::fs::rename(&partial, &target)
            .await
            .map_err(|e| StorageError::io(format!("moving artifact to {}", target.display()), e))?;
        sync_parent(&target).await?;

        let url = self.artifact_url(id, &file_name);
        tracing::info!(job_id = %id, url = %url, "Artifact published");
        Ok(url)
    }

    async fn remove_namespace(&self, id: JobId) -> Result<(), StorageError> {
        let dir = self.namespace_dir(id);
        match tokio::fs::remove_dir_all(&dir).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::io(format!("removing {}", dir.display()), e)),
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Sequence number of a canonical input name (`item_007.jpg` -> 7).
fn input_sequence(file_name: &str) -> Option<u64> {
    let rest = file_name.strip_prefix(INPUT_PREFIX)?.strip_prefix('_')?;
    let digits = rest.split('.').next()?;
    digits.parse().ok()
}

fn partial_path(target: &Path) -> PathBuf {
    let mut name = target.as_os_str().to_owned();
    name.push(PARTIAL_SUFFIX);
    PathBuf::from(name)
}

/// Write `bytes` to `path` and fsync before returning.
async fn write_synced(path: &Path, bytes: &[u8]) -> Result<(), StorageError> {
    let context = || format!("writing {}", path.display());
    let mut file = tokio::fs::File::create(path)
        .await
        .map_err(|e| StorageError::io(context(), e))?;
    file.write_all(bytes)
        .await
        .map_err(|e| StorageError::io(context(), e))?;
    file.sync_all()
        .await
        .map_err(|e| StorageError::io(context(), e))?;
    Ok(())
}

/// Replace `path` with `bytes` so readers never see a partial file.
///
/// The record's directory is synced after the rename so the replacement
/// itself survives a power loss.
async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), StorageError> {
    let partial = partial_path(path);
    write_synced(&partial, bytes).await?;
    tokio::fs::rename(&partial, path)
        .await
        .map_err(|e| StorageError::io(format!("replacing {}", path.display()), e))?;
    sync_parent(path).await
}

/// Fsync the directory containing `path`, persisting renames into it.
async fn sync_parent(path: &Path) -> Result<(), StorageError> {
    let Some(dir) = path.parent() else {
        return Ok(());
    };
    let context = || format!("syncing directory {}", dir.display());
    let handle = tokio::fs::File::open(dir)
        .await
        .map_err(|e| StorageError::io(context(), e))?;
    handle.sync_all().await.map_err(|e| StorageError::io(context(), e))
}
