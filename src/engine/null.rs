use super::{AudioChunk, AudioSink, Command, CommandSink, Engine, TranscriptSource, TranscriptionResult};
use anyhow::Result;
use futures::stream::{self, BoxStream, StreamExt};
use tracing::{debug, info};

/// Engine that accepts everything and produces nothing
///
/// Lets the gateway run without a message broker (UI development, smoke tests).
#[derive(Debug, Default)]
pub struct NullEngine;

#[async_trait::async_trait]
impl AudioSink for NullEngine {
    async fn send_audio(&self, chunk: AudioChunk) -> Result<()> {
        debug!(
            "Dropping audio frame ({} bytes, {}Hz, {}ch)",
            chunk.payload.len(),
            chunk.sample_rate,
            chunk.channels
        );
        Ok(())
    }
}

#[async_trait::async_trait]
impl CommandSink for NullEngine {
    async fn dispatch(&self, command: Command) -> Result<()> {
        info!(
            "Null engine received command {} {:?}",
            command.name(),
            command.properties()
        );
        Ok(())
    }
}

#[async_trait::async_trait]
impl TranscriptSource for NullEngine {
    async fn transcripts(&self) -> Result<BoxStream<'static, TranscriptionResult>> {
        Ok(stream::pending().boxed())
    }
}

impl Engine for NullEngine {
    fn name(&self) -> &str {
        "null"
    }
}
