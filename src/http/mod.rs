//! HTTP and WebSocket API for browsers
//!
//! - GET /ws - WebSocket audio in, transcription results out
//! - POST /api/upload - multipart file upload
//! - POST /api/start_play - start playback of an uploaded file
//! - POST /api/start_recording, /api/stop_recording - recording control
//! - GET /api/list_sessions - recorded session metadata
//! - GET /recordings/* - recorded files
//! - GET /health - Health check

mod error;
mod handlers;
mod routes;
mod state;

pub use error::ApiError;
pub use handlers::{SessionListResponse, StatusResponse};
pub use routes::create_router;
pub use state::AppState;
