pub mod config;
pub mod engine;
pub mod http;
pub mod nats;
pub mod relay;
pub mod storage;

pub use config::Config;
pub use engine::{
    AudioChunk, AudioSink, Command, CommandSink, CommandValue, Engine, EngineRegistry,
    SharedEngine, TranscriptSource, TranscriptionResult,
};
pub use http::{create_router, AppState};
pub use nats::NatsEngine;
pub use relay::{Broadcaster, ConnectionRegistry, MessageRouter, Session};
pub use storage::{SessionCatalog, UploadStore};
