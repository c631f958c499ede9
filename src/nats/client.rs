use super::messages::{AudioFrameMessage, CommandMessage, TranscriptMessage};
use crate::config::EngineConfig;
use crate::engine::{
    AudioChunk, AudioSink, Command, CommandSink, Engine, TranscriptSource, TranscriptionResult,
};
use anyhow::{Context, Result};
use async_nats::Client;
use base64::Engine as _;
use futures::stream::{BoxStream, StreamExt};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info, warn};

/// 16-bit PCM
const BYTES_PER_SAMPLE: u16 = 2;

/// External engine reached over a single shared NATS connection
pub struct NatsEngine {
    client: Client,
    audio_subject: String,
    command_prefix: String,
    transcript_subject: String,
    sequence: AtomicU64,
}

impl NatsEngine {
    /// Connect to NATS server
    pub async fn connect(config: &EngineConfig) -> Result<Self> {
        info!("Connecting to NATS at {}", config.nats_url);

        let client = async_nats::connect(&config.nats_url)
            .await
            .context("Failed to connect to NATS")?;

        info!("Connected to NATS successfully");

        Ok(Self {
            client,
            audio_subject: config.audio_subject.clone(),
            command_prefix: config.command_prefix.clone(),
            transcript_subject: config.transcript_subject.clone(),
            sequence: AtomicU64::new(0),
        })
    }

    fn command_subject(&self, command: &Command) -> String {
        format!("{}.{}", self.command_prefix, command.name())
    }
}

#[async_trait::async_trait]
impl AudioSink for NatsEngine {
    async fn send_audio(&self, chunk: AudioChunk) -> Result<()> {
        let sequence = self.sequence.fetch_add(1, Ordering::SeqCst);

        let message = AudioFrameMessage {
            sequence,
            pcm: base64::engine::general_purpose::STANDARD.encode(&chunk.payload),
            sample_rate: chunk.sample_rate,
            channels: chunk.channels,
            samples_per_channel: chunk.samples_per_channel,
            bytes_per_sample: BYTES_PER_SAMPLE,
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        let payload = serde_json::to_vec(&message)?;

        self.client
            .publish(self.audio_subject.clone(), payload.into())
            .await
            .context("Failed to publish audio frame")?;

        debug!(
            "Published audio frame to {} (seq={}, bytes={})",
            self.audio_subject,
            sequence,
            chunk.payload.len()
        );

        Ok(())
    }
}

#[async_trait::async_trait]
impl CommandSink for NatsEngine {
    async fn dispatch(&self, command: Command) -> Result<()> {
        let subject = self.command_subject(&command);
        let payload = serde_json::to_vec(&CommandMessage::new(&command))
            .context("Failed to encode command")?;

        // Plain publish: no reply subject, nothing to wait for
        self.client
            .publish(subject.clone(), payload.into())
            .await
            .context("Failed to publish command")?;

        info!("Dispatched command {} to {}", command.name(), subject);

        Ok(())
    }
}

#[async_trait::async_trait]
impl TranscriptSource for NatsEngine {
    async fn transcripts(&self) -> Result<BoxStream<'static, TranscriptionResult>> {
        info!("Subscribing to transcripts on {}", self.transcript_subject);

        let subscriber = self
            .client
            .subscribe(self.transcript_subject.clone())
            .await
            .context("Failed to subscribe to transcripts")?;

        let stream = subscriber.filter_map(|msg| async move {
            match serde_json::from_slice::<TranscriptMessage>(&msg.payload) {
                Ok(transcript) => Some(TranscriptionResult::from(transcript)),
                Err(e) => {
                    warn!("Failed to parse transcript message: {}", e);
                    None
                }
            }
        });

        Ok(stream.boxed())
    }
}

impl Engine for NatsEngine {
    fn name(&self) -> &str {
        "nats"
    }
}
