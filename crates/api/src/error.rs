use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use carscan_pipeline::PipelineError;
use serde_json::json;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`PipelineError`] and adds HTTP-specific variants.
/// Implements [`IntoResponse`] to produce consistent JSON error responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    /// The path does not name any job (unknown or malformed id).
    #[error("Job not found")]
    JobNotFound,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Pipeline(err) => match err {
                PipelineError::NotFound(_) => job_not_found(),
                PipelineError::Submission { id, source } => {
                    tracing::error!(job_id = %id, error = %source, "Scan submission failed");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "SUBMISSION_FAILED",
                        "Scan submission could not be stored".to_string(),
                    )
                }
                PipelineError::SubmissionInterrupted(id) => {
                    tracing::error!(job_id = %id, "Scan submission interrupted");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "SUBMISSION_FAILED",
                        "Scan submission could not be stored".to_string(),
                    )
                }
                PipelineError::Storage(_) | PipelineError::Core(_) => {
                    tracing::error!(error = %err, "Job storage error");
                    internal_error()
                }
            },
            AppError::JobNotFound => job_not_found(),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                internal_error()
            }
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

fn job_not_found() -> (StatusCode, &'static str, String) {
    (StatusCode::NOT_FOUND, "NOT_FOUND", "Job not found".to_string())
}

fn internal_error() -> (StatusCode, &'static str, String) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        "An internal error occurred".to_string(),
    )
}
