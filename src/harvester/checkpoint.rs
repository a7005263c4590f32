//! Resumable-session checkpointing
//!
//! One JSON record per output directory, holding the processed-URL history
//! and the dedup index. The record is written to a temp file in the same
//! directory and renamed into place, so a crash mid-save never corrupts the
//! previous checkpoint. Absence of a record is "no history", not an error.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

use crate::harvester::history::DownloadHistory;

/// Checkpoint filename within an output directory.
pub const CHECKPOINT_FILE: &str = "download_history.json";

/// Error types for checkpoint operations
#[derive(Error, Debug)]
pub enum CheckpointError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for checkpoint operations
pub type CheckpointResult<T> = Result<T, CheckpointError>;

/// Durable snapshot store for one output directory.
#[derive(Debug, Clone)]
pub struct Checkpoint {
    path: PathBuf,
}

impl Checkpoint {
    /// Checkpoint record location for an output directory.
    pub fn for_dir(output_dir: &Path) -> Self {
        Self {
            path: output_dir.join(CHECKPOINT_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the prior record, or `None` when no session has run here before.
    pub fn load(&self) -> CheckpointResult<Option<DownloadHistory>> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "no prior checkpoint");
            return Ok(None);
        }

        let contents = fs::read_to_string(&self.path)?;
        let mut history: DownloadHistory = serde_json::from_str(&contents)?;
        history.rebuild_index();

        info!(
            path = %self.path.display(),
            processed = history.processed_count(),
            unique = history.dedup_count(),
            "resumed download history",
        );
        Ok(Some(history))
    }

    /// Overwrite the record for this directory with a snapshot of `history`.
    ///
    /// Callers pass a snapshot taken under the write gate; the serialization
    /// here never races live mutation. The write goes through a temp file and
    /// a rename so the prior record survives a crash mid-save.
    pub fn save(&self, history: &DownloadHistory) -> CheckpointResult<()> {
        let serialized = serde_json::to_vec_pretty(history)?;

        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, &serialized)?;
        fs::rename(&tmp_path, &self.path)?;

        info!(
            path = %self.path.display(),
            processed = history.processed_count(),
            unique = history.dedup_count(),
            "checkpoint saved",
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harvester::fingerprint::ContentFingerprint;

    #[test]
    fn load_returns_none_when_absent() {
        let dir = tempfile::tempdir().unwrap();
        let checkpoint = Checkpoint::for_dir(dir.path());
        assert!(checkpoint.load().unwrap().is_none());
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let checkpoint = Checkpoint::for_dir(dir.path());

        let mut history = DownloadHistory::new();
        history.mark_processed("https://a.example/1.jpg");
        history.mark_processed("https://b.example/2.jpg");
        history.claim(
            ContentFingerprint::of_bytes(b"bytes"),
            "1.jpg".to_string(),
        );

        checkpoint.save(&history).unwrap();
        let restored = checkpoint.load().unwrap().expect("record must exist");

        assert_eq!(restored.processed_urls(), history.processed_urls());
        assert!(restored.is_processed("https://a.example/1.jpg"));
        assert_eq!(
            restored.owner_of(&ContentFingerprint::of_bytes(b"bytes")),
            Some("1.jpg")
        );
    }

    #[test]
    fn save_overwrites_prior_record() {
        let dir = tempfile::tempdir().unwrap();
        let checkpoint = Checkpoint::for_dir(dir.path());

        let mut first = DownloadHistory::new();
        first.mark_processed("https://a.example/1.jpg");
        checkpoint.save(&first).unwrap();

        let mut second = DownloadHistory::new();
        second.mark_processed("https://b.example/2.jpg");
        checkpoint.save(&second).unwrap();

        let restored = checkpoint.load().unwrap().unwrap();
        assert_eq!(restored.processed_count(), 1);
        assert!(restored.is_processed("https://b.example/2.jpg"));
        assert!(!restored.is_processed("https://a.example/1.jpg"));
    }

    #[test]
    fn no_temp_file_remains_after_save() {
        let dir = tempfile::tempdir().unwrap();
        let checkpoint = Checkpoint::for_dir(dir.path());
        checkpoint.save(&DownloadHistory::new()).unwrap();

        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .filter(|name| name.ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty(), "leftover temp files: {leftovers:?}");
    }
}
