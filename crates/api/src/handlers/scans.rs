//! Handlers for scan upload, status polling, and artifact download.

use axum::body::Body;
use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, Path, Request, State};
use axum::response::Response;
use axum::Json;
use carscan_core::job::JobRecord;
use carscan_core::types::{InputFile, JobId};
use carscan_storage::local::OUTPUT_DIR;
use serde::Serialize;
use tower::ServiceExt;
use tower_http::services::ServeFile;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Multipart field name carrying the images, repeated once per image.
pub const UPLOAD_FIELD: &str = "files";

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub id: JobId,
}

/// Parse a job id from a path segment. Malformed ids name no job.
fn parse_job_id(raw: &str) -> AppResult<JobId> {
    raw.parse().map_err(|_| AppError::JobNotFound)
}

// ---------------------------------------------------------------------------
// Upload
// ---------------------------------------------------------------------------

/// POST /upload-scan
///
/// Accepts a multipart form with one `files` field per image, in capture
/// order. Other fields are ignored. Returns `{ "id": ... }` as soon as the
/// job is stored; reconstruction continues in the background.
pub async fn upload_scan(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> AppResult<Json<UploadResponse>> {
    let mut multipart = multipart.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let mut files = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let original_name = field.file_name().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?;
        files.push(InputFile {
            original_name,
            bytes: bytes.to_vec(),
        });
    }

    let file_count = files.len();
    let id = state.jobs.submit(files).await?;
    tracing::info!(job_id = %id, files = file_count, "Scan uploaded");

    Ok(Json(UploadResponse { id }))
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// GET /scan-status/{id}
///
/// Returns the job record as stored. 404 if no such job exists.
pub async fn scan_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<JobRecord>> {
    let id = parse_job_id(&id)?;
    let record = state.jobs.get_status(id).await?;
    Ok(Json(record))
}

// ---------------------------------------------------------------------------
// Artifact download
// ---------------------------------------------------------------------------

/// GET /scans/{id}/output/{file}
///
/// Serves a published artifact. Only the job's output slot is reachable;
/// inputs and the record file are not.
pub async fn download_artifact(
    State(state): State<AppState>,
    Path((id, file)): Path<(String, String)>,
    request: Request,
) -> AppResult<Response> {
    let id = parse_job_id(&id)?;
    if file.is_empty() || file.starts_with('.') || file.contains(['/', '\\']) {
        return Err(AppError::JobNotFound);
    }

    let path = state
        .jobs
        .storage()
        .namespace_dir(id)
        .join(OUTPUT_DIR)
        .join(&file);

    let response = ServeFile::new(path)
        .oneshot(request)
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))?;
    Ok(response.map(Body::new))
}
