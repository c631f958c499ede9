use crate::config::StorageConfig;
use crate::engine::{AudioSink, CommandSink, SharedEngine};
use crate::relay::ConnectionRegistry;
use crate::storage::{SessionCatalog, UploadStore};
use std::sync::Arc;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Live WebSocket sessions
    pub registry: ConnectionRegistry,

    /// Destination of paired audio frames
    pub audio_sink: Arc<dyn AudioSink>,

    /// Destination of control commands
    pub commands: Arc<dyn CommandSink>,

    pub uploads: UploadStore,

    pub catalog: SessionCatalog,

    /// Upload body ceiling in bytes
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(
        registry: ConnectionRegistry,
        audio_sink: Arc<dyn AudioSink>,
        commands: Arc<dyn CommandSink>,
        storage: &StorageConfig,
    ) -> Self {
        Self {
            registry,
            audio_sink,
            commands,
            uploads: UploadStore::new(&storage.upload_dir),
            catalog: SessionCatalog::new(&storage.recordings_dir),
            max_upload_bytes: usize::try_from(storage.max_upload_bytes).unwrap_or(usize::MAX),
        }
    }

    /// State whose audio and command paths both go to `engine`
    pub fn with_engine(
        registry: ConnectionRegistry,
        engine: SharedEngine,
        storage: &StorageConfig,
    ) -> Self {
        let audio_sink: Arc<dyn AudioSink> = Arc::new(Arc::clone(&engine));
        let commands: Arc<dyn CommandSink> = Arc::new(engine);
        Self::new(registry, audio_sink, commands, storage)
    }
}
