pub mod client;
pub mod messages;

pub use client::NatsEngine;
pub use messages::{AudioFrameMessage, CommandMessage, TranscriptMessage};
