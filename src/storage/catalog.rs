use serde_json::{Map, Value};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, warn};

/// Per-session metadata file written by the recorder
pub const METADATA_FILE: &str = "metadata.json";

/// Result of one scan
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CatalogListing {
    /// Parsed metadata objects, ordered by session directory name
    pub sessions: Vec<Map<String, Value>>,
    /// Session directories whose metadata was missing or unparsable
    pub skipped: usize,
}

/// Read-only view of the recordings directory
#[derive(Debug, Clone)]
pub struct SessionCatalog {
    root: PathBuf,
}

impl SessionCatalog {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Collect `metadata.json` of every immediate subdirectory
    ///
    /// Never fails: an unreadable root yields an empty listing and bad entries
    /// are counted in `skipped`.
    pub async fn scan(&self) -> CatalogListing {
        let mut listing = CatalogListing::default();

        let mut entries = match fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("Recordings directory {} does not exist", self.root.display());
                return listing;
            }
            Err(e) => {
                warn!(
                    "Failed to read recordings directory {}: {}",
                    self.root.display(),
                    e
                );
                return listing;
            }
        };

        let mut session_dirs = Vec::new();
        loop {
            match entries.next_entry().await {
                Ok(Some(entry)) => {
                    let is_dir = entry
                        .file_type()
                        .await
                        .map(|file_type| file_type.is_dir())
                        .unwrap_or(false);
                    if is_dir {
                        session_dirs.push(entry.path());
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    warn!("Failed to read recordings directory entry: {}", e);
                    break;
                }
            }
        }
        session_dirs.sort();

        for dir in session_dirs {
            match read_metadata(&dir.join(METADATA_FILE)).await {
                Some(metadata) => listing.sessions.push(metadata),
                None => listing.skipped += 1,
            }
        }

        if listing.skipped > 0 {
            warn!(
                "list_sessions: skipped {} session(s) without readable metadata",
                listing.skipped
            );
        }
        info!("list_sessions: found {} sessions", listing.sessions.len());

        listing
    }
}

async fn read_metadata(path: &Path) -> Option<Map<String, Value>> {
    let bytes = match fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) => {
            debug!("Skipping {}: {}", path.display(), e);
            return None;
        }
    };

    match serde_json::from_slice::<Value>(&bytes) {
        Ok(Value::Object(metadata)) => Some(metadata),
        Ok(_) => {
            debug!("Skipping {}: not a JSON object", path.display());
            None
        }
        Err(e) => {
            debug!("Skipping {}: {}", path.display(), e);
            None
        }
    }
}
