use anyhow::{bail, Context, Result};
use axum::extract::ws::{Message, WebSocket};
use futures::future::join_all;
use futures::stream::SplitSink;
use futures::SinkExt;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};
use uuid::Uuid;

pub type SessionId = Uuid;

/// Write half of a session's transport
#[async_trait::async_trait]
pub trait OutboundSink: Send {
    async fn send_text(&mut self, text: String) -> Result<()>;

    async fn close(&mut self) -> Result<()>;
}

#[async_trait::async_trait]
impl OutboundSink for SplitSink<WebSocket, Message> {
    async fn send_text(&mut self, text: String) -> Result<()> {
        self.send(Message::Text(text))
            .await
            .context("Failed to write WebSocket frame")
    }

    async fn close(&mut self) -> Result<()> {
        SinkExt::close(self)
            .await
            .context("Failed to close WebSocket")
    }
}

/// One live connection
///
/// All writes go through `writer`, so a broadcast and any other write to the
/// same transport never interleave.
pub struct Session {
    id: SessionId,
    writer: Mutex<Box<dyn OutboundSink>>,
    closed: AtomicBool,
}

impl Session {
    pub fn new(sink: impl OutboundSink + 'static) -> Arc<Self> {
        Arc::new(Self {
            id: Uuid::new_v4(),
            writer: Mutex::new(Box::new(sink)),
            closed: AtomicBool::new(false),
        })
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Write one text frame
    pub async fn send_text(&self, text: &str) -> Result<()> {
        if self.is_closed() {
            bail!("Session {} is closed", self.id);
        }

        let mut writer = self.writer.lock().await;
        writer.send_text(text.to_string()).await
    }

    /// Close the transport; later calls are no-ops
    pub async fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }

        let mut writer = self.writer.lock().await;
        if let Err(e) = writer.close().await {
            debug!("Session {} close: {}", self.id, e);
        }
    }
}

/// Outcome of one broadcast
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    pub delivered: usize,
    pub dropped: usize,
}

/// Thread-safe set of live sessions
#[derive(Clone, Default)]
pub struct ConnectionRegistry {
    sessions: Arc<RwLock<HashMap<SessionId, Arc<Session>>>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a session; returns false if it was already registered
    pub async fn register(&self, session: Arc<Session>) -> bool {
        let mut sessions = self.sessions.write().await;
        let added = sessions.insert(session.id(), session).is_none();
        debug!("Registered sessions: {}", sessions.len());
        added
    }

    /// Remove a session; no-op if absent
    pub async fn unregister(&self, id: SessionId) -> Option<Arc<Session>> {
        let mut sessions = self.sessions.write().await;
        sessions.remove(&id)
    }

    pub async fn contains(&self, id: SessionId) -> bool {
        self.sessions.read().await.contains_key(&id)
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    /// Send `message` to every session registered at call time
    ///
    /// Sessions whose write fails are closed and removed; the rest still
    /// receive the message.
    pub async fn broadcast(&self, message: &str) -> BroadcastReport {
        let snapshot: Vec<Arc<Session>> = {
            let sessions = self.sessions.read().await;
            sessions.values().cloned().collect()
        };

        let results = join_all(snapshot.iter().map(|session| async move {
            (session, session.send_text(message).await)
        }))
        .await;

        let mut report = BroadcastReport::default();
        for (session, result) in results {
            match result {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    warn!("Failed to send message to session {}: {:#}", session.id(), e);
                    session.close().await;
                    self.unregister(session.id()).await;
                    report.dropped += 1;
                }
            }
        }

        report
    }

    /// Close and remove every session
    pub async fn close_all(&self) {
        let drained: Vec<Arc<Session>> = {
            let mut sessions = self.sessions.write().await;
            sessions.drain().map(|(_, session)| session).collect()
        };

        info!("Closing {} WebSocket session(s)", drained.len());

        join_all(drained.iter().map(|session| session.close())).await;
    }
}
