//! Harvester module tree
//!
//! Contains the concurrent fetch-dedup-persist pipeline and its thin
//! collaborators: backend search, age labeling, configuration, and logging.

pub mod checkpoint;
pub mod cli;
pub mod config;
pub mod filename;
pub mod fingerprint;
pub mod history;
pub mod labeler;
pub mod logging;
pub mod orchestrator;
pub mod pool;
pub mod search;
pub mod session;
pub mod worker;

// Re-export the types most callers need.
pub use checkpoint::{Checkpoint, CheckpointError, CheckpointResult};
pub use config::{AppConfig, ConfigError, ConfigResult, SessionConfig};
pub use fingerprint::ContentFingerprint;
pub use history::DownloadHistory;
pub use labeler::{AgeLabel, AgeLabeler, LabelError, SubjectAgeLabeler};
pub use orchestrator::{KeywordOutcome, Orchestrator, OrchestratorError};
pub use pool::{PoolSlot, WorkerPool};
pub use search::{SearchClient, SearchError};
pub use session::{Session, SessionError, SessionResult};
pub use worker::{Outcome, WorkerError};
