//! Durable cursor of the last processed alert id.
//!
//! This module provides the [`CursorStore`], a single integer persisted to a plain
//! text file so that alerts already handled are not replayed after a restart.

use std::{
    io,
    path::{Path, PathBuf},
};

use log::{debug, info, warn};
use thiserror::Error;
use tokio::fs;

/// File name of the cursor inside the data directory.
pub const CURSOR_FILE: &str = "last_alert_id";

/// Failure to persist the cursor.
#[derive(Debug, Error)]
pub enum CursorError {
    /// The cursor file could not be written.
    #[error("failed to write alert cursor to {path}: {source}")]
    Write {
        /// Cursor file path
        path: PathBuf,
        /// Underlying I/O error
        source: io::Error,
    },
}

/// Loads and saves the last processed alert id.
///
/// The store has a single sequential writer, the watch loop, and provides no
/// concurrent-write guarantees.
///
/// # Examples
///
/// ```no_run
/// # async fn example() -> Result<(), CursorError> {
/// let cursor = CursorStore::new("./data/last_alert_id");
///
/// let last_id = cursor.load().await; // 0 on first start
/// cursor.save(last_id + 1).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct CursorStore {
    /// Path to the cursor file.
    path: PathBuf,
}

impl CursorStore {
    /// Creates a new `CursorStore` backed by the file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        CursorStore { path: path.into() }
    }

    /// Path of the cursor file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the last processed alert id.
    ///
    /// A missing file is the normal first-start state and yields `0`. A file
    /// that does not hold an integer is logged and also yields `0`.
    pub async fn load(&self) -> u64 {
        let Ok(content) = fs::read_to_string(&self.path).await else {
            debug!(
                "no alert cursor at {}, starting from 0",
                self.path.display()
            );
            return 0;
        };

        match content.trim().parse() {
            Ok(id) => id,
            Err(e) => {
                warn!(
                    "unreadable alert cursor {:?} in {} ({}), starting from 0",
                    content,
                    self.path.display(),
                    e
                );
                0
            }
        }
    }

    /// Persists `id` as the last processed alert id.
    ///
    /// The value is written to a sibling temporary file and renamed over the
    /// cursor, so a crash mid-write leaves the previous value in place.
    ///
    /// # Errors
    ///
    /// Returns [`CursorError::Write`] when the file cannot be written or renamed.
    pub async fn save(&self, id: u64) -> Result<(), CursorError> {
        let staging = self.path.with_extension("tmp");

        let write = async {
            fs::write(&staging, id.to_string()).await?;
            fs::rename(&staging, &self.path).await
        };

        write.await.map_err(|source| CursorError::Write {
            path: self.path.clone(),
            source,
        })?;

        info!("current alert id {} was written to the cursor", id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_load_nonexistent_file_returns_zero() {
        let dir = TempDir::new().unwrap();
        let cursor = CursorStore::new(dir.path().join(CURSOR_FILE));

        assert_eq!(cursor.load().await, 0);
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let cursor = CursorStore::new(dir.path().join(CURSOR_FILE));

        cursor.save(133497288990000000).await.unwrap();
        assert_eq!(cursor.load().await, 133497288990000000);

        cursor.save(6).await.unwrap();
        assert_eq!(cursor.load().await, 6);
    }

    #[tokio::test]
    async fn test_survives_new_store_instance() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CURSOR_FILE);

        CursorStore::new(&path).save(42).await.unwrap();

        let restarted = CursorStore::new(&path);
        assert_eq!(restarted.load().await, 42);
    }

    #[tokio::test]
    async fn test_save_leaves_no_staging_file() {
        let dir = TempDir::new().unwrap();
        let cursor = CursorStore::new(dir.path().join(CURSOR_FILE));

        cursor.save(5).await.unwrap();

        assert!(!dir.path().join("last_alert_id.tmp").exists());
        assert_eq!(
            std::fs::read_to_string(cursor.path()).unwrap(),
            "5".to_string()
        );
    }

    #[tokio::test]
    async fn test_load_corrupted_file_returns_zero() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CURSOR_FILE);
        fs::write(&path, "not a number").await.unwrap();

        assert_eq!(CursorStore::new(path).load().await, 0);
    }

    #[tokio::test]
    async fn test_load_tolerates_trailing_newline() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CURSOR_FILE);
        fs::write(&path, "17\n").await.unwrap();

        assert_eq!(CursorStore::new(path).load().await, 17);
    }

    #[tokio::test]
    async fn test_save_into_missing_directory_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing").join(CURSOR_FILE);
        let cursor = CursorStore::new(&path);

        let err = cursor.save(3).await.unwrap_err();
        let CursorError::Write { path: failed, .. } = err;
        assert_eq!(failed, path);
    }
}
