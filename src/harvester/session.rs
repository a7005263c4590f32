//! Harvest session context
//!
//! One `Session` per output directory: the shared HTTP client, the bounded
//! worker pool, the write-gated download history, the labeler handle, and
//! the checkpoint store. Workers receive it as an `Arc`; nothing here is
//! process-global, so independent sessions can run side by side (the tests
//! rely on this).

use std::fs;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::Mutex;
use tracing::info;
use uuid::Uuid;

use crate::harvester::checkpoint::{Checkpoint, CheckpointError};
use crate::harvester::config::SessionConfig;
use crate::harvester::history::DownloadHistory;
use crate::harvester::labeler::AgeLabeler;
use crate::harvester::pool::WorkerPool;

/// Error types for session setup and teardown
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Checkpoint error: {0}")]
    Checkpoint(#[from] CheckpointError),
}

/// Result type for session operations
pub type SessionResult<T> = Result<T, SessionError>;

/// Shared context of one harvest session.
pub struct Session {
    pub id: Uuid,
    pub config: SessionConfig,
    pub client: reqwest::Client,
    pub pool: WorkerPool,
    /// The write gate: fingerprint-check-then-commit is atomic across all
    /// workers because the history is only reachable through this mutex.
    pub history: Mutex<DownloadHistory>,
    pub labeler: Arc<dyn AgeLabeler>,
    checkpoint: Checkpoint,
}

impl Session {
    /// Open a session for `config.output_dir`: create the directory if
    /// absent, build the HTTP client, and resume from a prior checkpoint
    /// when one exists.
    pub fn open(config: SessionConfig, labeler: Arc<dyn AgeLabeler>) -> SessionResult<Arc<Self>> {
        fs::create_dir_all(&config.output_dir)?;

        let client = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        let checkpoint = Checkpoint::for_dir(&config.output_dir);
        let history = checkpoint.load()?.unwrap_or_default();

        let id = Uuid::new_v4();
        info!(
            session = %id,
            output_dir = %config.output_dir.display(),
            concurrency = config.concurrency,
            limit = ?config.limit,
            resumed_urls = history.processed_count(),
            "session opened",
        );

        Ok(Arc::new(Self {
            id,
            pool: WorkerPool::new(config.concurrency),
            history: Mutex::new(history),
            client,
            labeler,
            checkpoint,
            config,
        }))
    }

    /// Whether the global processed-count limit has been reached.
    ///
    /// This is the soft pre-check; workers re-check under the write gate
    /// because concurrent admissions can race past it.
    pub async fn limit_reached(&self) -> bool {
        match self.config.limit {
            Some(limit) => self.history.lock().await.processed_count() >= limit,
            None => false,
        }
    }

    /// Snapshot the history under the gate and persist it.
    ///
    /// Serialization acts on a private copy, so it never races mutation by
    /// in-flight workers. Failures propagate: losing a checkpoint silently
    /// would cost real work on the next resume.
    pub async fn save_checkpoint(&self) -> SessionResult<()> {
        let snapshot = self.history.lock().await.clone();
        self.checkpoint.save(&snapshot)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harvester::config::AppConfig;
    use crate::harvester::labeler::SubjectAgeLabeler;

    fn test_config(dir: &std::path::Path) -> SessionConfig {
        let mut config = SessionConfig::from_app_config(
            &AppConfig::default(),
            "2006-02-17T00:00:00Z".to_string(),
        );
        config.output_dir = dir.to_path_buf();
        config
    }

    #[tokio::test]
    async fn open_creates_the_output_directory() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("nested/out");
        let mut config = test_config(&out);
        config.limit = Some(3);

        let session = Session::open(config, Arc::new(SubjectAgeLabeler)).unwrap();
        assert!(out.is_dir());
        assert!(!session.limit_reached().await);
    }

    #[tokio::test]
    async fn checkpoint_round_trips_through_a_new_session() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());

        let session = Session::open(config.clone(), Arc::new(SubjectAgeLabeler)).unwrap();
        {
            let mut history = session.history.lock().await;
            history.mark_processed("https://a.example/1.jpg");
        }
        session.save_checkpoint().await.unwrap();
        drop(session);

        let resumed = Session::open(config, Arc::new(SubjectAgeLabeler)).unwrap();
        let history = resumed.history.lock().await;
        assert!(history.is_processed("https://a.example/1.jpg"));
    }

    #[tokio::test]
    async fn limit_check_counts_processed_urls() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = test_config(dir.path());
        config.limit = Some(1);

        let session = Session::open(config, Arc::new(SubjectAgeLabeler)).unwrap();
        assert!(!session.limit_reached().await);
        session
            .history
            .lock()
            .await
            .mark_processed("https://a.example/1.jpg");
        assert!(session.limit_reached().await);
    }
}
