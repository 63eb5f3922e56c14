//! Shared fixtures for the gocapture test suite: synthetic photos, a
//! fast-failing remote configuration, and an in-process scoring server.

use crate::config::RemoteConfig;
use crate::frame::{CapturedImage, ImageSource};
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use image::{ImageFormat, Rgb, RgbImage};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

// =========================================================================
// Images
// =========================================================================

pub fn board_pixels(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        if (x / 4 + y / 4) % 2 == 0 {
            Rgb([210, 170, 80])
        } else {
            Rgb([15, 15, 15])
        }
    })
}

pub fn test_photo(width: u32, height: u32) -> CapturedImage {
    CapturedImage::new(
        board_pixels(width, height),
        ImageSource::Camera {
            path: PathBuf::from("tmp.jpg"),
        },
    )
}

pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    encode_as(width, height, ImageFormat::Jpeg)
}

pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    encode_as(width, height, ImageFormat::Png)
}

fn encode_as(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    let mut bytes = Vec::new();
    board_pixels(width, height)
        .write_to(&mut std::io::Cursor::new(&mut bytes), format)
        .unwrap();
    bytes
}

// =========================================================================
// Configuration
// =========================================================================

/// Remote settings with millisecond-scale timeouts
pub fn fast_remote_config(base_url: &str) -> RemoteConfig {
    RemoteConfig {
        base_url: base_url.to_string(),
        score_path: "api/score".to_string(),
        upload_path: "api/upload".to_string(),
        image_path: "sgf".to_string(),
        attempt_timeout_ms: 500,
        max_attempts: 3,
        initial_backoff_ms: 5,
        max_backoff_ms: 20,
        deadline_ms: 2_000,
    }
}

// =========================================================================
// In-process scoring server
// =========================================================================

/// How the fake server answers
#[derive(Clone)]
pub struct ServerBehavior {
    pub score_reply: Value,
    pub upload_reply: Value,
    pub result_image: Vec<u8>,
    /// Sleep before answering a POST
    pub delay: Duration,
    /// Answer this many POSTs with 503 before behaving
    pub failures_before_success: u32,
}

impl Default for ServerBehavior {
    fn default() -> Self {
        Self {
            score_reply: json!({"status": "White wins by 6.5", "image": "result.png"}),
            upload_reply: json!({"status": "ok", "url": "https://example.com/g/1"}),
            result_image: png_bytes(19, 19),
            delay: Duration::ZERO,
            failures_before_success: 0,
        }
    }
}

/// One request seen by the fake server
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: &'static str,
    pub path: String,
    pub body: Option<Value>,
}

struct ServerState {
    behavior: ServerBehavior,
    failures_left: AtomicU32,
    requests: Mutex<Vec<RecordedRequest>>,
}

pub struct MockServer {
    pub base_url: String,
    state: Arc<ServerState>,
    task: tokio::task::JoinHandle<()>,
}

impl MockServer {
    pub async fn start(behavior: ServerBehavior) -> Self {
        let state = Arc::new(ServerState {
            failures_left: AtomicU32::new(behavior.failures_before_success),
            behavior,
            requests: Mutex::new(Vec::new()),
        });

        let app = Router::new()
            .route("/api/score", post(score_handler))
            .route("/api/upload", post(upload_handler))
            .route("/sgf/:name", get(image_handler))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let task = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}", addr),
            state,
            task,
        }
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().unwrap().clone()
    }

    pub fn post_count(&self, path: &str) -> usize {
        self.requests()
            .iter()
            .filter(|r| r.method == "POST" && r.path == path)
            .count()
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn answer_post(state: &ServerState, path: &str, body: Value, reply: &Value) -> Response {
    state.requests.lock().unwrap().push(RecordedRequest {
        method: "POST",
        path: path.to_string(),
        body: Some(body),
    });

    if !state.behavior.delay.is_zero() {
        tokio::time::sleep(state.behavior.delay).await;
    }

    let should_fail = state
        .failures_left
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok();
    if should_fail {
        return StatusCode::SERVICE_UNAVAILABLE.into_response();
    }

    Json(reply.clone()).into_response()
}

async fn score_handler(State(state): State<Arc<ServerState>>, Json(body): Json<Value>) -> Response {
    let reply = state.behavior.score_reply.clone();
    answer_post(&state, "/api/score", body, &reply).await
}

async fn upload_handler(State(state): State<Arc<ServerState>>, Json(body): Json<Value>) -> Response {
    let reply = state.behavior.upload_reply.clone();
    answer_post(&state, "/api/upload", body, &reply).await
}

async fn image_handler(State(state): State<Arc<ServerState>>, Path(name): Path<String>) -> Response {
    state.requests.lock().unwrap().push(RecordedRequest {
        method: "GET",
        path: format!("/sgf/{}", name),
        body: None,
    });
    Bytes::from(state.behavior.result_image.clone()).into_response()
}
