use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;

/// Default upload ceiling: 100 MiB
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 100 * 1024 * 1024;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub engine: EngineConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
    pub cors_permissive: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub upload_dir: PathBuf,
    pub recordings_dir: PathBuf,
    pub max_upload_bytes: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    pub kind: String,
    pub nats_url: String,
    pub audio_subject: String,
    pub command_prefix: String,
    pub transcript_subject: String,
}

impl Config {
    /// Load configuration: defaults, then `path` (optional), then `GATEWAY__*` env vars
    pub fn load(path: &str) -> Result<Self> {
        let upload_dir = std::env::temp_dir().join("audio_uploads");

        let settings = config::Config::builder()
            .set_default("server.bind", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("server.cors_permissive", true)?
            .set_default("storage.upload_dir", upload_dir.to_string_lossy().to_string())?
            .set_default("storage.recordings_dir", "./recordings")?
            .set_default("storage.max_upload_bytes", DEFAULT_MAX_UPLOAD_BYTES)?
            .set_default("engine.kind", "nats")?
            .set_default("engine.nats_url", "nats://localhost:4222")?
            .set_default("engine.audio_subject", "audio.frame")?
            .set_default("engine.command_prefix", "cmd")?
            .set_default("engine.transcript_subject", "asr.result")?
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix("GATEWAY")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to build configuration")?;

        settings
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Socket address string for the HTTP listener
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.server.bind, self.server.port)
    }
}
