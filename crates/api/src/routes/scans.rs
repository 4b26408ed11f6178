//! Route definitions for scan jobs.

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use carscan_storage::ARTIFACT_ROUTE_PREFIX;

use crate::handlers::scans;
use crate::state::AppState;

/// Scan routes, mounted at the root.
///
/// ```text
/// POST   /upload-scan                 -> upload_scan
/// GET    /scan-status/{id}            -> scan_status
/// GET    /scans/{id}/output/{file}    -> download_artifact
/// ```
pub fn router(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route(
            "/upload-scan",
            post(scans::upload_scan).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .route("/scan-status/{id}", get(scans::scan_status))
        .route(
            &format!("{ARTIFACT_ROUTE_PREFIX}/{{id}}/output/{{file}}"),
            get(scans::download_artifact),
        )
}
