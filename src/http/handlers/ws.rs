use crate::http::state::AppState;
use crate::relay::{MessageRouter, Session};
use axum::{
    extract::{
        ws::{WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::StreamExt;
use std::sync::Arc;
use tracing::info;

/// Maximum inbound WebSocket message size (16 MiB)
const MAX_WS_MESSAGE_SIZE: usize = 16 * 1024 * 1024;

/// GET /ws
/// Upgrade to a WebSocket session
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.max_message_size(MAX_WS_MESSAGE_SIZE)
        .on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let (sender, receiver) = socket.split();

    let session = Session::new(sender);
    let session_id = session.id();
    state.registry.register(Arc::clone(&session)).await;

    info!("New WebSocket client connected: {}", session_id);

    MessageRouter::new(session_id, Arc::clone(&state.audio_sink))
        .run(receiver)
        .await;

    state.registry.unregister(session_id).await;
    session.close().await;

    info!("WebSocket client disconnected: {}", session_id);
}
