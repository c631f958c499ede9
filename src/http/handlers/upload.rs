use super::StatusResponse;
use crate::http::{error::ApiError, state::AppState};
use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        Multipart, State,
    },
    http::StatusCode,
    response::Json,
};
use tracing::error;

/// Multipart field carrying the file
const FILE_FIELD: &str = "file";

/// POST /api/upload
/// Store the `file` field in the upload directory
pub async fn upload(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<StatusResponse>, ApiError> {
    let mut multipart = multipart.map_err(|e| {
        error!("Failed to parse multipart form: {}", e);
        ApiError::bad_request("Failed to parse form")
    })?;

    loop {
        let mut field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => {
                error!("Failed to get file from form: no {:?} field", FILE_FIELD);
                return Err(ApiError::bad_request("No file uploaded"));
            }
            Err(e) => return Err(body_error(e)),
        };

        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let original_name = field.file_name().unwrap_or_default().to_string();

        let mut pending = state.uploads.begin(&original_name).await.map_err(|e| {
            error!("Failed to create destination file: {:#}", e);
            ApiError::internal("Failed to save file")
        })?;

        loop {
            match field.chunk().await {
                Ok(Some(chunk)) => {
                    if let Err(e) = pending.write(&chunk).await {
                        error!("Failed to copy file content: {:#}", e);
                        pending.abort().await;
                        return Err(ApiError::internal("Failed to save file"));
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    pending.abort().await;
                    return Err(body_error(e));
                }
            }
        }

        let record = pending.finish().await.map_err(|e| {
            error!("Failed to finish upload: {:#}", e);
            ApiError::internal("Failed to save file")
        })?;

        return Ok(Json(
            StatusResponse::ok("File uploaded successfully")
                .with_file_path(record.stored_path.to_string_lossy()),
        ));
    }
}

/// Map a body read failure to 413 or 400
fn body_error(e: MultipartError) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        error!("Upload exceeds size limit: {}", e);
        ApiError::PayloadTooLarge("File too large".to_string())
    } else {
        error!("Failed to parse multipart form: {}", e);
        ApiError::bad_request("Failed to parse form")
    }
}
