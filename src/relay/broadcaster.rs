use super::registry::{BroadcastReport, ConnectionRegistry};
use crate::engine::TranscriptionResult;
use anyhow::{Context, Result};
use futures::stream::{Stream, StreamExt};
use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

/// Outbound `asr_result` envelope
#[derive(Debug, Serialize)]
pub struct AsrResultMessage<'a> {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub text: &'a str,
    #[serde(rename = "final")]
    pub is_final: bool,
}

impl<'a> AsrResultMessage<'a> {
    pub fn new(result: &'a TranscriptionResult) -> Self {
        Self {
            kind: "asr_result",
            text: &result.text,
            is_final: result.is_final,
        }
    }
}

/// Fans transcription results out to every connected browser
#[derive(Clone)]
pub struct Broadcaster {
    registry: ConnectionRegistry,
}

impl Broadcaster {
    pub fn new(registry: ConnectionRegistry) -> Self {
        Self { registry }
    }

    /// Broadcast one result
    pub async fn publish(&self, result: &TranscriptionResult) -> Result<BroadcastReport> {
        if result.is_final {
            info!("Received final ASR result: text='{}'", result.text);
        } else {
            debug!("Received interim ASR result: text='{}'", result.text);
        }

        let message = serde_json::to_string(&AsrResultMessage::new(result))
            .context("Failed to encode asr_result")?;

        Ok(self.registry.broadcast(&message).await)
    }

    /// Broadcast every result from `transcripts` until the stream ends
    pub async fn run<S>(self, mut transcripts: S)
    where
        S: Stream<Item = TranscriptionResult> + Unpin,
    {
        info!("Transcript broadcaster started");

        while let Some(result) = transcripts.next().await {
            match self.publish(&result).await {
                Ok(report) if report.dropped > 0 => {
                    debug!(
                        "Broadcast delivered to {}, dropped {}",
                        report.delivered, report.dropped
                    );
                }
                Ok(_) => {}
                Err(e) => error!("Failed to broadcast transcript: {:#}", e),
            }
        }

        info!("Transcript broadcaster stopped");
    }

    pub fn spawn<S>(self, transcripts: S) -> JoinHandle<()>
    where
        S: Stream<Item = TranscriptionResult> + Unpin + Send + 'static,
    {
        tokio::spawn(self.run(transcripts))
    }
}
