//! WebSocket relay core
//!
//! - `registry`: live sessions and broadcast fan-out
//! - `router`: per-connection metadata → payload state machine
//! - `broadcaster`: transcription results → every connected browser

mod broadcaster;
mod registry;
mod router;

pub use broadcaster::{AsrResultMessage, Broadcaster};
pub use registry::{BroadcastReport, ConnectionRegistry, OutboundSink, Session, SessionId};
pub use router::{AudioMetadata, BinaryOutcome, MessageRouter, RouterState, TextOutcome};
