use anyhow::{Context, Result};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs::{self, File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};

/// Fallback name when the client sends nothing usable
const DEFAULT_BASE_NAME: &str = "upload";

/// Attempts before giving up on finding a free name
const MAX_NAME_ATTEMPTS: u32 = 100;

/// A stored upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRecord {
    pub original_name: String,
    pub stored_path: PathBuf,
    pub bytes_written: u64,
}

/// Keep only the last path component of a client-supplied file name
pub fn sanitize_base_name(name: &str) -> String {
    let base = name
        .rsplit(|c: char| c == '/' || c == '\\')
        .next()
        .unwrap_or_default()
        .trim();

    match base {
        "" | "." | ".." => DEFAULT_BASE_NAME.to_string(),
        other => other.to_string(),
    }
}

/// `<unix_ts>_<sanitized base name>`
pub fn stored_file_name(timestamp: i64, original: &str) -> String {
    format!("{}_{}", timestamp, sanitize_base_name(original))
}

/// Managed upload directory
#[derive(Debug, Clone)]
pub struct UploadStore {
    dir: PathBuf,
}

impl UploadStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the upload directory if it does not exist
    pub async fn ensure_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("Failed to create upload directory {}", self.dir.display()))
    }

    /// Open a new, not-yet-existing file for `original_name`
    ///
    /// Stored files are never overwritten: if `<ts>_<name>` is taken, a counter
    /// is inserted (`<ts>_<n>_<name>`).
    pub async fn begin(&self, original_name: &str) -> Result<PendingUpload> {
        let timestamp = chrono::Utc::now().timestamp();
        let base = sanitize_base_name(original_name);

        for attempt in 0..MAX_NAME_ATTEMPTS {
            let file_name = if attempt == 0 {
                stored_file_name(timestamp, &base)
            } else {
                format!("{}_{}_{}", timestamp, attempt, base)
            };
            let path = self.dir.join(file_name);

            match OpenOptions::new().write(true).create_new(true).open(&path).await {
                Ok(file) => {
                    return Ok(PendingUpload {
                        original_name: original_name.to_string(),
                        path,
                        file,
                        bytes_written: 0,
                    })
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => {
                    return Err(e).with_context(|| {
                        format!("Failed to create destination file {}", path.display())
                    })
                }
            }
        }

        anyhow::bail!("No free file name for upload {:?}", original_name)
    }
}

/// An upload being streamed to disk
pub struct PendingUpload {
    original_name: String,
    path: PathBuf,
    file: File,
    bytes_written: u64,
}

impl PendingUpload {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn write(&mut self, chunk: &[u8]) -> Result<()> {
        self.file
            .write_all(chunk)
            .await
            .with_context(|| format!("Failed to write {}", self.path.display()))?;
        self.bytes_written += chunk.len() as u64;
        Ok(())
    }

    /// Flush and close the file
    pub async fn finish(mut self) -> Result<UploadRecord> {
        self.file
            .flush()
            .await
            .with_context(|| format!("Failed to flush {}", self.path.display()))?;

        info!(
            "File uploaded successfully: {} ({} bytes)",
            self.path.display(),
            self.bytes_written
        );

        Ok(UploadRecord {
            original_name: self.original_name,
            stored_path: self.path,
            bytes_written: self.bytes_written,
        })
    }

    /// Remove the partial file
    pub async fn abort(self) {
        let PendingUpload { path, file, .. } = self;
        drop(file);

        if let Err(e) = fs::remove_file(&path).await {
            warn!("Failed to remove partial upload {}: {}", path.display(), e);
        }
    }
}
