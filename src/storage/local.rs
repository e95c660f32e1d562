//! Local filesystem storage implementation.
//!
//! Covers are written to a temporary sibling file first and renamed into
//! place, so a concurrent reader either sees the previous file or the
//! complete new one.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::storage::ArtifactStore;
use crate::utils::artifact_path;

/// Distinguishes temporary files of concurrent writes to the same key.
static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Local filesystem storage backend.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    extension: String,
}

impl LocalStorage {
    /// Create a store that appends `extension` to every key.
    pub fn new(extension: impl Into<String>) -> Self {
        Self {
            extension: extension.into(),
        }
    }

    /// Unique temporary path next to `path`.
    ///
    /// The name does not embed the target's file name, so any key that fits
    /// the filesystem's name limit also has a temp file that fits.
    fn tmp_path(path: &Path) -> PathBuf {
        let seq = TMP_COUNTER.fetch_add(1, Ordering::Relaxed);
        path.with_file_name(format!(".cover-{}-{seq}.tmp", std::process::id()))
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let tmp = Self::tmp_path(path);
        let written = async {
            let mut file = tokio::fs::File::create(&tmp).await?;
            file.write_all(bytes).await?;
            file.flush().await?;
            file.sync_all().await?;
            drop(file);
            tokio::fs::rename(&tmp, path).await
        }
        .await;

        if written.is_err() {
            let _ = tokio::fs::remove_file(&tmp).await;
        }
        written
    }
}

impl Default for LocalStorage {
    fn default() -> Self {
        Self::new("jpg")
    }
}

#[async_trait]
impl ArtifactStore for LocalStorage {
    async fn prepare(&self, destination_dir: &Path) -> Result<()> {
        tokio::fs::create_dir_all(destination_dir)
            .await
            .map_err(|source| AppError::DestinationUnavailable {
                path: destination_dir.to_path_buf(),
                source,
            })
    }

    async fn save(&self, key: &str, payload: &[u8], destination_dir: &Path) -> Result<PathBuf> {
        let path = artifact_path(destination_dir, key, &self.extension);
        match Self::write_bytes(&path, payload).await {
            Ok(()) => {
                log::debug!("Saved {} ({} bytes)", path.display(), payload.len());
                Ok(path)
            }
            Err(source) => Err(AppError::StoreWriteFailed { path, source }),
        }
    }
}
