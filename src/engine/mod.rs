//! External engine abstraction
//!
//! The gateway never talks to the processing engine directly. It holds three
//! narrow capabilities, injected at startup:
//! - [`AudioSink`] - accepts paired PCM frames from browsers
//! - [`CommandSink`] - accepts fire-and-forget named commands
//! - [`TranscriptSource`] - yields transcription results for broadcast
//!
//! Concrete engines are built through the [`EngineRegistry`].

mod command;
mod null;
mod registry;

pub use command::{Command, CommandValue};
pub use null::NullEngine;
pub use registry::{EngineFactory, EngineRegistry};

use anyhow::Result;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// One PCM frame received from a browser, paired with its metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioChunk {
    /// Raw interleaved PCM, forwarded unmodified
    pub payload: Vec<u8>,
    pub sample_rate: u32,
    pub channels: u16,
    pub samples_per_channel: u32,
}

/// A transcription result emitted by the engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptionResult {
    pub text: String,
    #[serde(rename = "final")]
    pub is_final: bool,
}

/// Receives audio frames forwarded from WebSocket sessions
#[async_trait::async_trait]
pub trait AudioSink: Send + Sync {
    async fn send_audio(&self, chunk: AudioChunk) -> Result<()>;
}

/// Dispatches named commands without waiting for a reply
#[async_trait::async_trait]
pub trait CommandSink: Send + Sync {
    async fn dispatch(&self, command: Command) -> Result<()>;
}

/// Source of transcription events
#[async_trait::async_trait]
pub trait TranscriptSource: Send + Sync {
    async fn transcripts(&self) -> Result<BoxStream<'static, TranscriptionResult>>;
}

#[async_trait::async_trait]
impl<T: AudioSink + ?Sized> AudioSink for Arc<T> {
    async fn send_audio(&self, chunk: AudioChunk) -> Result<()> {
        (**self).send_audio(chunk).await
    }
}

#[async_trait::async_trait]
impl<T: CommandSink + ?Sized> CommandSink for Arc<T> {
    async fn dispatch(&self, command: Command) -> Result<()> {
        (**self).dispatch(command).await
    }
}

/// Full engine capability set, as produced by an [`EngineFactory`]
pub trait Engine: AudioSink + CommandSink + TranscriptSource {
    /// Engine name for logging
    fn name(&self) -> &str;
}

/// Shared engine handle
pub type SharedEngine = Arc<dyn Engine>;
