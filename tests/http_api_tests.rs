// Integration tests for the HTTP API
//
// Requests are driven through the router with `oneshot`; the engine is
// replaced by in-memory sinks.

use anyhow::{bail, Result};
use audio_relay_gateway::config::StorageConfig;
use audio_relay_gateway::{
    create_router, AppState, AudioChunk, AudioSink, Command, CommandSink, CommandValue,
    ConnectionRegistry,
};
use axum::body::Body;
use axum::http::{header::CONTENT_TYPE, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tower::ServiceExt;

const BOUNDARY: &str = "gateway-test-boundary";

#[derive(Default)]
struct DiscardAudio;

#[async_trait::async_trait]
impl AudioSink for DiscardAudio {
    async fn send_audio(&self, _chunk: AudioChunk) -> Result<()> {
        Ok(())
    }
}

#[derive(Default)]
struct RecordingCommands {
    sent: Mutex<Vec<Command>>,
    fail: bool,
}

#[async_trait::async_trait]
impl CommandSink for RecordingCommands {
    async fn dispatch(&self, command: Command) -> Result<()> {
        if self.fail {
            bail!("engine unavailable");
        }
        self.sent.lock().unwrap().push(command);
        Ok(())
    }
}

struct TestApp {
    router: Router,
    commands: Arc<RecordingCommands>,
    _dir: TempDir,
    upload_dir: std::path::PathBuf,
    recordings_dir: std::path::PathBuf,
}

fn test_app_with(commands: RecordingCommands, max_upload_bytes: u64) -> TestApp {
    let dir = TempDir::new().unwrap();
    let upload_dir = dir.path().join("uploads");
    let recordings_dir = dir.path().join("recordings");
    fs::create_dir_all(&upload_dir).unwrap();
    fs::create_dir_all(&recordings_dir).unwrap();

    let storage = StorageConfig {
        upload_dir: upload_dir.clone(),
        recordings_dir: recordings_dir.clone(),
        max_upload_bytes,
    };

    let commands = Arc::new(commands);
    let state = AppState::new(
        ConnectionRegistry::new(),
        Arc::new(DiscardAudio),
        Arc::clone(&commands) as Arc<dyn CommandSink>,
        &storage,
    );

    TestApp {
        router: create_router(state),
        commands,
        _dir: dir,
        upload_dir,
        recordings_dir,
    }
}

fn test_app() -> TestApp {
    test_app_with(RecordingCommands::default(), 1024 * 1024)
}

fn multipart_file(field: &str, file_name: &str, content: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn multipart_text(fields: &[(&str, &str)]) -> Vec<u8> {
    let mut body = String::new();
    for (name, value) in fields {
        body.push_str(&format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
        ));
    }
    body.push_str(&format!("--{BOUNDARY}--\r\n"));
    body.into_bytes()
}

fn multipart_request(uri: &str, body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
        .body(Body::from(body))
        .unwrap()
}

fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn send(app: &TestApp, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

// ============================================================================
// Upload
// ============================================================================

#[tokio::test]
async fn test_upload_stores_exact_bytes() {
    let app = test_app();
    let content = b"0123456789";

    let (status, body) = send(
        &app,
        multipart_request("/api/upload", multipart_file("file", "test.wav", content)),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let file_path = body["file_path"].as_str().unwrap();
    let path = Path::new(file_path);
    let base_name = path.file_name().unwrap().to_string_lossy();
    assert!(base_name.ends_with("test.wav"));
    assert!(path.starts_with(&app.upload_dir));
    assert_eq!(fs::read(path).unwrap(), content);
}

#[tokio::test]
async fn test_upload_strips_client_directories() {
    let app = test_app();

    let (status, body) = send(
        &app,
        multipart_request("/api/upload", multipart_file("file", "../../evil.wav", b"x")),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let path = Path::new(body["file_path"].as_str().unwrap());
    assert_eq!(path.parent().unwrap(), app.upload_dir.as_path());
}

#[tokio::test]
async fn test_upload_without_file_field_is_400() {
    let app = test_app();

    let (status, body) = send(
        &app,
        multipart_request("/api/upload", multipart_text(&[("other", "value")])),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"status": "error", "message": "No file uploaded"}));
}

#[tokio::test]
async fn test_upload_without_multipart_is_400() {
    let app = test_app();

    let (status, body) = send(&app, empty_request("POST", "/api/upload")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "error");
}

#[tokio::test]
async fn test_upload_over_limit_is_rejected() {
    let app = test_app_with(RecordingCommands::default(), 64);

    let (status, body) = send(
        &app,
        multipart_request("/api/upload", multipart_file("file", "big.wav", &[7u8; 4096])),
    )
    .await;

    assert!(status.is_client_error(), "got {status}");
    assert_eq!(body["status"], "error");
    // Nothing left behind
    assert_eq!(fs::read_dir(&app.upload_dir).unwrap().count(), 0);
}

#[tokio::test]
async fn test_upload_into_missing_directory_is_500() {
    let dir = TempDir::new().unwrap();
    let storage = StorageConfig {
        upload_dir: dir.path().join("missing").join("deeper"),
        recordings_dir: dir.path().join("recordings"),
        max_upload_bytes: 1024 * 1024,
    };
    let state = AppState::new(
        ConnectionRegistry::new(),
        Arc::new(DiscardAudio),
        Arc::new(RecordingCommands::default()),
        &storage,
    );
    let app = TestApp {
        router: create_router(state),
        commands: Arc::new(RecordingCommands::default()),
        upload_dir: storage.upload_dir.clone(),
        recordings_dir: storage.recordings_dir.clone(),
        _dir: dir,
    };

    let (status, body) = send(
        &app,
        multipart_request("/api/upload", multipart_file("file", "test.wav", b"0123456789")),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"status": "error", "message": "Failed to save file"}));
    assert!(!app.upload_dir.exists());
}

#[tokio::test]
async fn test_upload_get_is_405() {
    let app = test_app();

    let (status, body) = send(&app, empty_request("GET", "/api/upload")).await;

    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body, json!({"status": "error", "message": "Method not allowed"}));
}

// ============================================================================
// Control
// ============================================================================

#[tokio::test]
async fn test_start_play_dispatches_command() {
    let app = test_app();

    let request = Request::builder()
        .method("POST")
        .uri("/api/start_play")
        .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from("file_path=%2Fa.wav&loop_playback=true"))
        .unwrap();
    let (status, body) = send(&app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok", "message": "Playback started"}));

    let sent = app.commands.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].name(), "start_play");
    assert_eq!(
        sent[0].property("file_path"),
        Some(&CommandValue::String("/a.wav".to_string()))
    );
    assert_eq!(sent[0].property("loop_playback"), Some(&CommandValue::Bool(true)));
}

#[tokio::test]
async fn test_start_play_accepts_multipart_and_defaults_loop() {
    let app = test_app();

    let (status, _) = send(
        &app,
        multipart_request("/api/start_play", multipart_text(&[("file_path", "/b.wav")])),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let sent = app.commands.sent.lock().unwrap();
    assert_eq!(
        sent[0].property("file_path"),
        Some(&CommandValue::String("/b.wav".to_string()))
    );
    assert_eq!(sent[0].property("loop_playback"), Some(&CommandValue::Bool(false)));
}

#[tokio::test]
async fn test_start_play_requires_file_path() {
    let app = test_app();

    let (status, body) = send(&app, empty_request("POST", "/api/start_play")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"status": "error", "message": "file_path is required"}));
    assert!(app.commands.sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_recording_commands_have_no_properties() {
    let app = test_app();

    let (status, body) = send(&app, empty_request("POST", "/api/start_recording")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok", "message": "Recording started"}));

    let (status, body) = send(&app, empty_request("POST", "/api/stop_recording")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok", "message": "Recording stopped"}));

    let sent = app.commands.sent.lock().unwrap();
    let names: Vec<&str> = sent.iter().map(|cmd| cmd.name()).collect();
    assert_eq!(names, vec!["start_recording", "stop_recording"]);
    assert!(sent.iter().all(|cmd| cmd.properties().is_empty()));
}

#[tokio::test]
async fn test_recording_get_is_405() {
    let app = test_app();

    let (status, _) = send(&app, empty_request("GET", "/api/start_recording")).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);

    let (status, _) = send(&app, empty_request("GET", "/api/stop_recording")).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);

    assert!(app.commands.sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_dispatch_failure_is_500() {
    let app = test_app_with(
        RecordingCommands {
            fail: true,
            ..Default::default()
        },
        1024,
    );

    let (status, body) = send(&app, empty_request("POST", "/api/start_recording")).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"status": "error", "message": "Failed to send command"}));
}

// ============================================================================
// Session listing
// ============================================================================

#[tokio::test]
async fn test_list_sessions_empty() {
    let app = test_app();

    let (status, body) = send(&app, empty_request("GET", "/api/list_sessions")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok", "count": 0, "sessions": []}));
}

#[tokio::test]
async fn test_list_sessions_skips_bad_metadata() {
    let app = test_app();

    let write = |session: &str, metadata: Option<&str>| {
        let dir = app.recordings_dir.join(session);
        fs::create_dir_all(&dir).unwrap();
        if let Some(metadata) = metadata {
            fs::write(dir.join("metadata.json"), metadata).unwrap();
        }
    };
    write("session-a", Some(r#"{"session_id":"a","duration":1.5}"#));
    write("session-b", Some("{not json"));
    write("session-c", None);
    write("session-d", Some(r#"{"session_id":"d"}"#));
    fs::write(app.recordings_dir.join("stray.txt"), "ignored").unwrap();

    let (status, body) = send(&app, empty_request("GET", "/api/list_sessions")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 2);
    assert_eq!(body["sessions"][0]["session_id"], "a");
    assert_eq!(body["sessions"][1]["session_id"], "d");
}

#[tokio::test]
async fn test_list_sessions_post_is_405() {
    let app = test_app();

    let (status, _) = send(&app, empty_request("POST", "/api/list_sessions")).await;

    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_recordings_are_served() {
    let app = test_app();
    let dir = app.recordings_dir.join("session-a");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("audio.pcm"), b"pcm-bytes").unwrap();

    let response = app
        .router
        .clone()
        .oneshot(empty_request("GET", "/recordings/session-a/audio.pcm"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&bytes[..], b"pcm-bytes");
}

#[tokio::test]
async fn test_health_check() {
    let app = test_app();

    let response = app
        .router
        .clone()
        .oneshot(empty_request("GET", "/health"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}
