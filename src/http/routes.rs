use super::handlers;
use super::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    let recordings = ServeDir::new(state.catalog.root());
    let upload_limit = DefaultBodyLimit::max(state.max_upload_bytes);

    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Browser audio + transcription results
        .route(
            "/ws",
            get(handlers::ws::ws_handler).fallback(handlers::method_not_allowed),
        )
        // Uploads
        .route(
            "/api/upload",
            post(handlers::upload::upload)
                .fallback(handlers::method_not_allowed)
                .layer(upload_limit),
        )
        // Engine control
        .route(
            "/api/start_play",
            post(handlers::control::start_play).fallback(handlers::method_not_allowed),
        )
        .route(
            "/api/start_recording",
            post(handlers::control::start_recording).fallback(handlers::method_not_allowed),
        )
        .route(
            "/api/stop_recording",
            post(handlers::control::stop_recording).fallback(handlers::method_not_allowed),
        )
        // Recorded sessions
        .route(
            "/api/list_sessions",
            get(handlers::sessions::list_sessions).fallback(handlers::method_not_allowed),
        )
        .nest_service("/recordings", recordings)
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
