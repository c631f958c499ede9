use super::registry::SessionId;
use crate::engine::{AudioChunk, AudioSink};
use axum::extract::ws::Message;
use futures::stream::{Stream, StreamExt};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Discriminant of the metadata frame that announces a binary payload
pub const AUDIO_DATA_TYPE: &str = "audio_data";

/// Bytes per sample of the PCM payload (16-bit)
const BYTES_PER_SAMPLE: usize = 2;

/// Inbound text envelope
///
/// Negative or oversized numeric fields fail to parse, so the frame counts as
/// malformed and any pending metadata is kept.
#[derive(Debug, Deserialize)]
struct InboundEnvelope {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    sample_rate: u32,
    #[serde(default)]
    channels: u16,
    #[serde(default)]
    samples_per_channel: u32,
}

/// Description of the next binary frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioMetadata {
    pub sample_rate: u32,
    pub channels: u16,
    pub samples_per_channel: u32,
}

impl AudioMetadata {
    /// Payload length implied by the metadata
    pub fn expected_len(&self) -> usize {
        self.channels as usize * self.samples_per_channel as usize * BYTES_PER_SAMPLE
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouterState {
    AwaitingMetadata,
    AwaitingPayload(AudioMetadata),
}

/// What a text frame did to the state machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextOutcome {
    /// Metadata stored; `replaced` is true when an unconsumed one was discarded
    MetadataStored { replaced: bool },
    /// Valid envelope with some other `type`
    Ignored { kind: String },
    /// Not a JSON envelope
    Malformed { error: String },
}

/// What a binary frame did to the state machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BinaryOutcome {
    Forwarded,
    /// Sink returned an error; the frame is lost but the pairing is consumed
    SinkFailed,
    /// No pending metadata; frame discarded
    Orphaned,
}

/// Per-connection inbound protocol: a metadata text frame pairs with the next
/// binary frame
pub struct MessageRouter {
    session_id: SessionId,
    state: RouterState,
    sink: Arc<dyn AudioSink>,
}

impl MessageRouter {
    pub fn new(session_id: SessionId, sink: Arc<dyn AudioSink>) -> Self {
        Self {
            session_id,
            state: RouterState::AwaitingMetadata,
            sink,
        }
    }

    pub fn state(&self) -> RouterState {
        self.state
    }

    pub fn handle_text(&mut self, text: &str) -> TextOutcome {
        let envelope = match serde_json::from_str::<InboundEnvelope>(text) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!("Session {}: failed to parse JSON message: {}", self.session_id, e);
                return TextOutcome::Malformed {
                    error: e.to_string(),
                };
            }
        };

        if envelope.kind != AUDIO_DATA_TYPE {
            warn!(
                "Session {}: ignoring message of type {:?}",
                self.session_id, envelope.kind
            );
            return TextOutcome::Ignored {
                kind: envelope.kind,
            };
        }

        let replaced = matches!(self.state, RouterState::AwaitingPayload(_));
        if replaced {
            warn!(
                "Session {}: discarding unconsumed audio metadata",
                self.session_id
            );
        }

        self.state = RouterState::AwaitingPayload(AudioMetadata {
            sample_rate: envelope.sample_rate,
            channels: envelope.channels,
            samples_per_channel: envelope.samples_per_channel,
        });

        TextOutcome::MetadataStored { replaced }
    }

    pub async fn handle_binary(&mut self, payload: Vec<u8>) -> BinaryOutcome {
        let metadata = match std::mem::replace(&mut self.state, RouterState::AwaitingMetadata) {
            RouterState::AwaitingPayload(metadata) => metadata,
            RouterState::AwaitingMetadata => {
                warn!(
                    "Session {}: dropping {} byte binary frame without metadata",
                    self.session_id,
                    payload.len()
                );
                return BinaryOutcome::Orphaned;
            }
        };

        if payload.len() != metadata.expected_len() {
            debug!(
                "Session {}: payload is {} bytes, metadata implies {}",
                self.session_id,
                payload.len(),
                metadata.expected_len()
            );
        }

        let chunk = AudioChunk {
            payload,
            sample_rate: metadata.sample_rate,
            channels: metadata.channels,
            samples_per_channel: metadata.samples_per_channel,
        };

        match self.sink.send_audio(chunk).await {
            Ok(()) => BinaryOutcome::Forwarded,
            Err(e) => {
                warn!("Session {}: failed to forward audio: {:#}", self.session_id, e);
                BinaryOutcome::SinkFailed
            }
        }
    }

    /// Process frames in arrival order until the peer closes or the transport fails
    pub async fn run<S, E>(mut self, mut frames: S)
    where
        S: Stream<Item = Result<Message, E>> + Unpin,
        E: std::fmt::Display,
    {
        while let Some(frame) = frames.next().await {
            match frame {
                Ok(Message::Text(text)) => {
                    self.handle_text(&text);
                }
                Ok(Message::Binary(payload)) => {
                    self.handle_binary(payload).await;
                }
                Ok(Message::Close(_)) => {
                    info!("Session {}: closed by client", self.session_id);
                    break;
                }
                // Ping/pong are answered by the transport
                Ok(_) => {}
                Err(e) => {
                    warn!("Session {}: read error: {}", self.session_id, e);
                    break;
                }
            }
        }
    }
}
