//! Durable checkpoint storage
//!
//! Write-through persistence for the crawl checkpoint: the pipeline flushes
//! after every state transition that must survive a crash, never batched.

use std::path::{Path, PathBuf};

use anyhow::Result;
use tokio::fs;
use tracing::{info, warn};

use crate::domain::checkpoint::{CrawlCheckpoint, CHECKPOINT_VERSION};
use crate::infrastructure::fs_atomic::{read_json, write_json_atomic};

pub struct CheckpointStore {
    path: PathBuf,
}

impl CheckpointStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Load the durable checkpoint, falling back to an empty one when no
    /// snapshot exists or the snapshot version is unknown.
    pub async fn load_or_default(&self) -> CrawlCheckpoint {
        if !self.path.exists() {
            return CrawlCheckpoint::default();
        }
        match read_json::<CrawlCheckpoint>(&self.path).await {
            Ok(checkpoint) if checkpoint.version == CHECKPOINT_VERSION => {
                info!(
                    "Resuming from checkpoint: {} brands, {} phones complete",
                    checkpoint.completed_brands.len(),
                    checkpoint.completed_phone_urls.len()
                );
                checkpoint
            }
            Ok(checkpoint) => {
                warn!(
                    "Checkpoint version {} is unknown, starting fresh",
                    checkpoint.version
                );
                CrawlCheckpoint::default()
            }
            Err(e) => {
                warn!("Checkpoint unreadable ({e:#}), starting fresh");
                CrawlCheckpoint::default()
            }
        }
    }

    /// Flush the checkpoint atomically (temp file + rename).
    pub async fn flush(&self, checkpoint: &CrawlCheckpoint) -> Result<()> {
        write_json_atomic(&self.path, checkpoint).await
    }

    /// Operator reset: discard all completion state.
    pub async fn reset(&self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path).await?;
            info!("Checkpoint reset: {}", self.path.display());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_flush_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = CheckpointStore::new(dir.path().join("progress.json"));

        let mut cp = CrawlCheckpoint::default();
        cp.mark_phone_done("https://example.com/a.php");
        cp.mark_brand_complete("Nokia");
        store.flush(&cp).await.unwrap();

        let loaded = store.load_or_default().await;
        assert!(loaded.is_brand_complete("Nokia"));
        assert!(loaded.is_phone_done("https://example.com/a.php"));
    }

    #[tokio::test]
    async fn test_missing_file_yields_default() {
        let dir = tempfile::tempdir().unwrap();
        let store = CheckpointStore::new(dir.path().join("progress.json"));

        let loaded = store.load_or_default().await;
        assert!(loaded.completed_brands.is_empty());
        assert!(loaded.completed_phone_urls.is_empty());
    }

    #[tokio::test]
    async fn test_reset_discards_state() {
        let dir = tempfile::tempdir().unwrap();
        let store = CheckpointStore::new(dir.path().join("progress.json"));

        let mut cp = CrawlCheckpoint::default();
        cp.mark_brand_complete("Nokia");
        store.flush(&cp).await.unwrap();
        store.reset().await.unwrap();

        let loaded = store.load_or_default().await;
        assert!(loaded.completed_brands.is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_file_falls_back_to_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("progress.json");
        tokio::fs::write(&path, "{not json").await.unwrap();

        let store = CheckpointStore::new(&path);
        let loaded = store.load_or_default().await;
        assert!(loaded.completed_brands.is_empty());
    }
}
