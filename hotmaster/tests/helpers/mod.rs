//! Test Helper Utilities
//!
//! Shared utilities for the hotmaster integration tests

#![allow(dead_code)]

pub mod audio_generator;
pub mod scripted_engine;

pub use audio_generator::{generate_test_wav, test_wav_bytes, AudioConfig};
pub use scripted_engine::ScriptedEngine;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use hotmaster::engine::EngineConfig;
use hotmaster::services::VotingEngine;
use hotmaster::AppState;
use hotmaster_common::config::{DataFolders, EngineSettings, PreviewSettings};
use hotmaster_common::FadeCurve;
use http_body_util::BodyExt;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tower::ServiceExt;

/// Short preview windows so one-second fixtures still have several windows
pub fn test_engine_config() -> EngineConfig {
    EngineConfig::from_settings(
        &EngineSettings::default(),
        &PreviewSettings {
            size_seconds: 0.5,
            analysis_step_seconds: 0.1,
            fade_seconds: 0.05,
            fade_coefficient: 8,
            fade_curve: FadeCurve::Linear,
        },
    )
}

/// App state over a fresh data folder, using the scripted engine and a
/// seeded voting engine
pub fn test_app_state() -> (AppState, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let folders = DataFolders::new(temp_dir.path().join("data"));
    folders.ensure_exists().unwrap();

    let state = AppState::with_voting(
        Arc::new(ScriptedEngine::new()),
        test_engine_config(),
        folders,
        VotingEngine::with_seed(7),
    );
    (state, temp_dir)
}

/// Hand-built multipart/form-data body
pub struct MultipartBuilder {
    boundary: String,
    body: Vec<u8>,
}

impl MultipartBuilder {
    pub fn new() -> Self {
        Self {
            boundary: "hotmaster-test-boundary".to_string(),
            body: Vec::new(),
        }
    }

    pub fn file(mut self, name: &str, filename: &str, data: &[u8]) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
                self.boundary, name, filename
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(data);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                self.boundary, name, value
            )
            .as_bytes(),
        );
        self
    }

    pub fn build(mut self) -> Request<Body> {
        self.body
            .extend_from_slice(format!("--{}--\r\n", self.boundary).as_bytes());
        Request::builder()
            .method("POST")
            .uri("/jobs")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={}", self.boundary),
            )
            .body(Body::from(self.body))
            .unwrap()
    }
}

pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes().to_vec();
    (status, body)
}

pub async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let (status, body) = send(app, request).await;
    (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
}

pub async fn post_json(app: &Router, uri: &str, payload: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(payload.to_string()))
        .unwrap();
    let (status, body) = send(app, request).await;
    (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
}

/// Poll the status endpoint until the job reports `completed`
pub async fn wait_for_completion(app: &Router, job_id: &str) -> Value {
    for _ in 0..1200 {
        let (status, body) = get_json(app, &format!("/jobs/{}/status", job_id)).await;
        assert_eq!(status, StatusCode::OK);
        if body["status"] == "completed" {
            return body;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    panic!("job {} did not complete in time", job_id);
}
