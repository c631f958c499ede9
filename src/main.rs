use anyhow::{Context, Result};
use audio_relay_gateway::{
    create_router, AppState, Broadcaster, Config, ConnectionRegistry, EngineRegistry,
};
use clap::Parser;
use std::future::IntoFuture;
use tower_http::cors::CorsLayer;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "audio-relay-gateway", about = "Relay browser audio to an external engine")]
struct Args {
    /// Config file (extension optional)
    #[arg(long, default_value = "config/gateway")]
    config: String,

    /// Override the HTTP port
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let mut cfg = Config::load(&args.config)?;
    if let Some(port) = args.port {
        cfg.server.port = port;
    }

    info!("Audio relay gateway v{}", env!("CARGO_PKG_VERSION"));
    info!("Upload directory: {}", cfg.storage.upload_dir.display());
    info!("Recordings directory: {}", cfg.storage.recordings_dir.display());

    let engine = EngineRegistry::with_builtins()
        .create(&cfg.engine.kind, cfg.engine.clone())
        .await
        .context("Failed to create engine")?;
    info!("Using engine: {}", engine.name());

    let registry = ConnectionRegistry::new();
    let state = AppState::with_engine(registry.clone(), engine.clone(), &cfg.storage);

    if let Err(e) = state.uploads.ensure_dir().await {
        error!("{:#}", e);
    }
    if let Err(e) = tokio::fs::create_dir_all(&cfg.storage.recordings_dir).await {
        warn!("Failed to create recordings directory: {}", e);
    }

    let transcripts = engine
        .transcripts()
        .await
        .context("Failed to subscribe to transcripts")?;
    let broadcaster = Broadcaster::new(registry.clone()).spawn(transcripts);

    let mut app = create_router(state);
    if cfg.server.cors_permissive {
        app = app.layer(CorsLayer::permissive());
    }

    let addr = cfg.listen_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("HTTP server listening on {}", addr);

    // In-flight requests are not drained: on Ctrl-C the sessions are closed and
    // the listener is dropped with the server future.
    tokio::select! {
        result = axum::serve(listener, app).into_future() => {
            result.context("HTTP server error")?;
        }
        signal = tokio::signal::ctrl_c() => {
            if let Err(e) = signal {
                error!("Failed to listen for shutdown signal: {}", e);
            }
            info!("Shutting down");
            registry.close_all().await;
        }
    }

    broadcaster.abort();
    info!("Stopped with {} session(s) registered", registry.len().await);

    Ok(())
}
