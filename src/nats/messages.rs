use crate::engine::{Command, CommandValue, TranscriptionResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Audio frame message published to NATS
#[derive(Debug, Serialize, Deserialize)]
pub struct AudioFrameMessage {
    pub sequence: u64,
    pub pcm: String,  // Base64-encoded PCM bytes
    pub sample_rate: u32,
    pub channels: u16,
    pub samples_per_channel: u32,
    pub bytes_per_sample: u16,
    pub timestamp: String,  // RFC3339 timestamp
}

/// Command message published to `<prefix>.<name>`
#[derive(Debug, Serialize)]
pub struct CommandMessage<'a> {
    pub name: &'a str,
    pub properties: &'a BTreeMap<String, CommandValue>,
    pub issued_at: String,
}

impl<'a> CommandMessage<'a> {
    pub fn new(command: &'a Command) -> Self {
        Self {
            name: command.name(),
            properties: command.properties(),
            issued_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Transcript message received from the engine
#[derive(Debug, Serialize, Deserialize)]
pub struct TranscriptMessage {
    pub text: String,
    #[serde(rename = "final")]
    pub final_result: bool,
}

impl From<TranscriptMessage> for TranscriptionResult {
    fn from(msg: TranscriptMessage) -> Self {
        TranscriptionResult {
            text: msg.text,
            is_final: msg.final_result,
        }
    }
}
