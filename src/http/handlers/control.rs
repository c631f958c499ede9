use super::StatusResponse;
use crate::engine::Command;
use crate::http::{error::ApiError, state::AppState};
use anyhow::Result;
use axum::{
    extract::{Form, FromRequest, Multipart, Query, Request, State},
    http::header::CONTENT_TYPE,
    response::Json,
};
use serde::Deserialize;
use tracing::{error, info};

// ============================================================================
// Request Types
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct StartPlayForm {
    #[serde(default)]
    pub file_path: String,

    /// Only the exact string `true` enables looping
    #[serde(default)]
    pub loop_playback: String,
}

impl StartPlayForm {
    pub fn loop_enabled(&self) -> bool {
        self.loop_playback == "true"
    }

    /// Read from a multipart body, an urlencoded body, or the query string
    async fn extract(request: Request, state: &AppState) -> Result<Self, ApiError> {
        let content_type = request
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();

        if content_type.starts_with("multipart/form-data") {
            let multipart = Multipart::from_request(request, state)
                .await
                .map_err(|e| form_error(&e))?;
            return Self::from_multipart(multipart).await;
        }

        if content_type.starts_with("application/x-www-form-urlencoded") {
            let Form(form) = Form::<StartPlayForm>::from_request(request, state)
                .await
                .map_err(|e| form_error(&e))?;
            return Ok(form);
        }

        let Query(form) =
            Query::<StartPlayForm>::try_from_uri(request.uri()).map_err(|e| form_error(&e))?;
        Ok(form)
    }

    async fn from_multipart(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut form = StartPlayForm::default();

        while let Some(field) = multipart.next_field().await.map_err(|e| form_error(&e))? {
            let name = field.name().unwrap_or_default().to_string();
            let target = match name.as_str() {
                "file_path" => &mut form.file_path,
                "loop_playback" => &mut form.loop_playback,
                _ => continue,
            };
            *target = field.text().await.map_err(|e| form_error(&e))?;
        }

        Ok(form)
    }
}

fn form_error(e: &dyn std::fmt::Display) -> ApiError {
    error!("Failed to parse form: {}", e);
    ApiError::bad_request("Failed to parse form")
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/start_play
/// Ask the engine to play an uploaded file
pub async fn start_play(
    State(state): State<AppState>,
    request: Request,
) -> Result<Json<StatusResponse>, ApiError> {
    let form = StartPlayForm::extract(request, &state).await?;

    if form.file_path.is_empty() {
        error!("file_path is empty or missing");
        return Err(ApiError::bad_request("file_path is required"));
    }

    let loop_playback = form.loop_enabled();
    info!(
        "Received start_play request: file_path={}, loop={}",
        form.file_path, loop_playback
    );

    let command = Command::new(Command::START_PLAY).map(|cmd| {
        cmd.with_property("file_path", form.file_path)
            .with_property("loop_playback", loop_playback)
    });

    dispatch(&state, command, "Playback started").await
}

/// POST /api/start_recording
pub async fn start_recording(
    State(state): State<AppState>,
) -> Result<Json<StatusResponse>, ApiError> {
    dispatch(&state, Command::new(Command::START_RECORDING), "Recording started").await
}

/// POST /api/stop_recording
pub async fn stop_recording(
    State(state): State<AppState>,
) -> Result<Json<StatusResponse>, ApiError> {
    dispatch(&state, Command::new(Command::STOP_RECORDING), "Recording stopped").await
}

/// Send a command without waiting for the engine
async fn dispatch(
    state: &AppState,
    command: Result<Command>,
    ok_message: &str,
) -> Result<Json<StatusResponse>, ApiError> {
    let command = command.map_err(|e| {
        error!("Failed to create command: {:#}", e);
        ApiError::internal("Failed to create command")
    })?;
    let name = command.name().to_string();

    state.commands.dispatch(command).await.map_err(|e| {
        error!("Failed to send command {}: {:#}", name, e);
        ApiError::internal("Failed to send command")
    })?;

    info!("{} command sent", name);

    Ok(Json(StatusResponse::ok(ok_message)))
}
