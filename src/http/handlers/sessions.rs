use super::SessionListResponse;
use crate::http::state::AppState;
use axum::{extract::State, response::Json};

/// GET /api/list_sessions
/// List metadata of every recorded session
pub async fn list_sessions(State(state): State<AppState>) -> Json<SessionListResponse> {
    let listing = state.catalog.scan().await;

    Json(SessionListResponse {
        status: "ok",
        count: listing.sessions.len(),
        sessions: listing.sessions,
    })
}
