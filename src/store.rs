//! Progress persistence: one JSON file per key under the data directory.
//!
//! This module owns:
//!   - per-profile progress records (`progress_<key>.json`)
//!   - the global "test finished" marker required by the follow-up page
//!   - the UI theme preference (separately namespaced key)
//!
//! Reads never fail the caller: an absent or malformed record degrades to
//! the empty default so the wizard restarts at question 0. Writes are
//! serialized by a single async mutex; last write wins.

use std::path::PathBuf;

use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, instrument, warn};

use crate::domain::{ProgressRecord, UiTheme};
use crate::util::storage_key;

const FINISHED_KEY: &str = "test_finished";
const THEME_KEY: &str = "ui_theme";

/// Errors surfaced by the store. Reads swallow these (degrade to default);
/// writes propagate them to the API boundary.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub struct ProgressStore {
    root: PathBuf,
    write_lock: Mutex<()>,
}

impl ProgressStore {
    /// Open (and create) the data directory.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root, write_lock: Mutex::new(()) })
    }

    fn progress_path(&self, profile_name: &str) -> PathBuf {
        self.root.join(format!("progress_{}.json", storage_key(profile_name)))
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.json"))
    }

    /// Persist the record for this profile, overwriting any prior value.
    #[instrument(level = "debug", skip(self, record), fields(%profile_name, idx = record.idx))]
    pub async fn save_progress(
        &self,
        profile_name: &str,
        record: &ProgressRecord,
    ) -> Result<(), StoreError> {
        let body = serde_json::to_vec(record)?;
        let _guard = self.write_lock.lock().await;
        tokio::fs::write(self.progress_path(profile_name), body).await?;
        Ok(())
    }

    /// Last saved record, or the empty default sized to `question_count`.
    /// A record that fails to read or parse counts as absent, not fatal.
    #[instrument(level = "debug", skip(self), fields(%profile_name, question_count))]
    pub async fn load_progress(&self, profile_name: &str, question_count: usize) -> ProgressRecord {
        let path = self.progress_path(profile_name);
        let raw = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(_) => return ProgressRecord::default().normalized(question_count),
        };
        match serde_json::from_slice::<ProgressRecord>(&raw) {
            Ok(record) => record.normalized(question_count),
            Err(e) => {
                warn!(target: "anketa_backend", %profile_name, error = %e, "Malformed progress record; restarting at question 0");
                ProgressRecord::default().normalized(question_count)
            }
        }
    }

    pub async fn has_progress(&self, profile_name: &str) -> bool {
        tokio::fs::try_exists(self.progress_path(profile_name))
            .await
            .unwrap_or(false)
    }

    /// Remove the record. Idempotent: clearing an absent record is a no-op.
    #[instrument(level = "debug", skip(self), fields(%profile_name))]
    pub async fn clear_progress(&self, profile_name: &str) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        match tokio::fs::remove_file(self.progress_path(profile_name)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    // --- Session-complete marker ---

    pub async fn mark_finished(&self) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        tokio::fs::write(self.key_path(FINISHED_KEY), b"true").await?;
        Ok(())
    }

    pub async fn is_finished(&self) -> bool {
        tokio::fs::try_exists(self.key_path(FINISHED_KEY))
            .await
            .unwrap_or(false)
    }

    pub async fn reset_finished(&self) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        match tokio::fs::remove_file(self.key_path(FINISHED_KEY)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    // --- Theme preference ---

    pub async fn save_theme(&self, theme: UiTheme) -> Result<(), StoreError> {
        let body = serde_json::to_vec(&theme)?;
        let _guard = self.write_lock.lock().await;
        tokio::fs::write(self.key_path(THEME_KEY), body).await?;
        Ok(())
    }

    /// Stored preference, defaulting to light when absent or unreadable.
    pub async fn load_theme(&self) -> UiTheme {
        let raw = match tokio::fs::read(self.key_path(THEME_KEY)).await {
            Ok(bytes) => bytes,
            Err(_) => return UiTheme::default(),
        };
        serde_json::from_slice(&raw).unwrap_or_else(|e| {
            debug!(target: "anketa_backend", error = %e, "Unreadable theme preference; using default");
            UiTheme::default()
        })
    }
}
