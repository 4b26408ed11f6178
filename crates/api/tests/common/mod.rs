#![allow(dead_code)]

use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

use carscan_api::config::ServerConfig;
use carscan_api::router::build_app_router;
use carscan_api::state::AppState;

pub const BASE_URL: &str = "http://scans.test";
pub const SAMPLE_BYTES: &[u8] = b"glTF-binary-sample";
const BOUNDARY: &str = "carscan-test-boundary";

/// An application rooted in its own temporary directory.
pub struct TestApp {
    pub dir: tempfile::TempDir,
    pub config: ServerConfig,
    pub state: AppState,
}

impl TestApp {
    /// Build an app whose stand-in reconstructor waits `delay` per job.
    pub fn new(delay: Duration) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let sample = dir.path().join("sample.glb");
        std::fs::write(&sample, SAMPLE_BYTES).unwrap();

        let config = ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            scans_dir: dir.path().join("scans"),
            work_dir: dir.path().join("work"),
            public_base_url: BASE_URL.to_string(),
            sample_model_path: sample,
            processing_delay_secs: delay.as_secs(),
            max_concurrent_jobs: 4,
            cors_origins: vec!["http://localhost:5173".to_string()],
            request_timeout_secs: 30,
            shutdown_timeout_secs: 5,
            max_upload_bytes: 16 * 1024 * 1024,
        };
        std::fs::create_dir_all(&config.scans_dir).unwrap();

        let state = AppState::from_config(&config);
        Self { dir, config, state }
    }

    /// The same router production builds, over this app's state.
    pub fn router(&self) -> Router {
        build_app_router(self.state.clone(), &self.config)
    }

    pub async fn get(&self, uri: &str) -> Response<Body> {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        self.router().oneshot(request).await.unwrap()
    }

    /// POST `/upload-scan` with one `files` part per `(file_name, bytes)`.
    pub async fn upload(&self, files: &[(&str, &[u8])]) -> Response<Body> {
        self.router().oneshot(multipart_request(files)).await.unwrap()
    }

    /// Poll `/scan-status/{id}` until the job leaves `processing`.
    pub async fn wait_terminal(&self, id: &str) -> serde_json::Value {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        loop {
            let json = body_json(self.get(&format!("/scan-status/{id}")).await).await;
            if json["status"] != "processing" {
                return json;
            }
            assert!(tokio::time::Instant::now() < deadline, "job {id} never finished");
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }
}

pub fn multipart_request(files: &[(&str, &[u8])]) -> Request<Body> {
    let mut body = Vec::new();
    for (name, bytes) in files {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"files\"; filename=\"{name}\"\r\n").as_bytes(),
        );
        body.extend_from_slice(b"Content-Type: image/jpeg\r\n\r\n");
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri("/upload-scan")
        .header("content-type", format!("multipart/form-data; boundary={BOUNDARY}"))
        .body(Body::from(body))
        .unwrap()
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response.into_body().collect().await.unwrap().to_bytes().to_vec()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}
