//! Download worker: the unit of concurrent work
//!
//! One worker handles one candidate URL end to end: fetch, format sniff,
//! fingerprint, dedup check, collision-safe persist, processed-set append,
//! then the label-rename step. Per-item failures are caught here and never
//! propagate to the orchestrator or the pool; one bad item must never abort
//! the batch.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::harvester::filename::{self, Collision};
use crate::harvester::fingerprint::ContentFingerprint;
use crate::harvester::pool::PoolSlot;
use crate::harvester::session::Session;

/// Error types for a single download attempt
#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("Fetch error: {0}")]
    Fetch(#[from] reqwest::Error),

    #[error("Fetch returned HTTP {0}")]
    HttpStatus(reqwest::StatusCode),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for download operations
pub type WorkerResult<T> = Result<T, WorkerError>;

/// What happened to one candidate URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Bytes persisted (and, when labeling succeeded, renamed).
    Saved { filename: String },
    /// URL completed a save cycle in this or an earlier session; no network
    /// request and no filesystem write happened.
    AlreadyProcessed,
    /// An identical payload already exists on disk under the probed name.
    AlreadyOnDisk { filename: String },
    /// Identical content was already saved under another filename.
    DuplicateContent { owner: String },
    /// Payload did not sniff as a known image format.
    InvalidImage,
    /// The global processed-count limit was reached at commit time.
    LimitReached,
    /// Transient per-item failure; the pool and session continue unaffected.
    Failed { reason: String },
}

/// Process one candidate URL, holding an admitted pool slot.
///
/// The slot is released (and the in-flight count decremented) on every exit
/// path when it drops at the end of this function.
pub async fn run(session: Arc<Session>, url: String, slot: PoolSlot) -> Outcome {
    let _slot = slot;

    let outcome = match process(&session, &url).await {
        Ok(outcome) => outcome,
        Err(err) => {
            warn!(url = %url, error = %err, "download failed");
            return Outcome::Failed {
                reason: err.to_string(),
            };
        }
    };

    match &outcome {
        Outcome::Saved { filename } => info!(url = %url, filename = %filename, "saved image"),
        Outcome::AlreadyProcessed => debug!(url = %url, "skip: already processed"),
        Outcome::AlreadyOnDisk { filename } => {
            info!(url = %url, filename = %filename, "skip: already downloaded");
        }
        Outcome::DuplicateContent { owner } => {
            info!(url = %url, owner = %owner, "skip: duplicate of existing file");
        }
        Outcome::InvalidImage => warn!(url = %url, "skip: invalid image payload"),
        Outcome::LimitReached => debug!(url = %url, "skip: download limit reached"),
        Outcome::Failed { .. } => {}
    }
    outcome
}

async fn process(session: &Session, url: &str) -> WorkerResult<Outcome> {
    // Idempotent skip before any network work.
    if session.history.lock().await.is_processed(url) {
        return Ok(Outcome::AlreadyProcessed);
    }

    let bytes = fetch(session, url).await?;
    commit_bytes(session, url, &bytes).await
}

/// Fetch the raw payload. The session client carries the browser identity
/// header and the short socket timeout.
async fn fetch(session: &Session, url: &str) -> WorkerResult<Vec<u8>> {
    let response = session.client.get(url).send().await?;
    if !response.status().is_success() {
        return Err(WorkerError::HttpStatus(response.status()));
    }
    Ok(response.bytes().await?.to_vec())
}

/// Validate, dedup, persist, and label an already-fetched payload.
///
/// The write gate (the history mutex) is held from the fingerprint check
/// through the byte write and the processed-set append, so no two workers
/// can claim the same fingerprint or target the same path concurrently.
/// Labeling runs after the gate is released.
pub(crate) async fn commit_bytes(
    session: &Session,
    url: &str,
    bytes: &[u8],
) -> WorkerResult<Outcome> {
    if image::guess_format(bytes).is_err() {
        return Ok(Outcome::InvalidImage);
    }

    let (stem, ext) = filename::derive_parts(url);
    let fingerprint = ContentFingerprint::of_bytes(bytes);
    let output_dir = session.config.output_dir.clone();

    let chosen = {
        let mut history = session.history.lock().await;

        if history.is_processed(url) {
            return Ok(Outcome::AlreadyProcessed);
        }

        if let Some(owner) = history.owner_of(&fingerprint) {
            return Ok(Outcome::DuplicateContent {
                owner: owner.to_string(),
            });
        }

        let resolved = filename::resolve_collision(&stem, &ext, &fingerprint, |name| {
            let path = output_dir.join(name);
            if path.exists() {
                Ok(Some(ContentFingerprint::of_file(&path)?))
            } else {
                Ok(None)
            }
        })?;

        let chosen = match resolved {
            Collision::AlreadyOnDisk(name) => {
                return Ok(Outcome::AlreadyOnDisk { filename: name });
            }
            Collision::Fresh(name) => name,
        };

        // Re-check the limit under the gate: concurrent workers can race
        // past the orchestrator's soft pre-check.
        if let Some(limit) = session.config.limit
            && history.processed_count() >= limit
        {
            return Ok(Outcome::LimitReached);
        }

        history.claim(fingerprint, chosen.clone());
        tokio::fs::write(output_dir.join(&chosen), bytes).await?;
        history.mark_processed(url);
        chosen
    };

    Ok(label_artifact(session, &chosen).await)
}

/// Invoke the labeler and rename the saved artifact to embed the label.
///
/// Any labeling or rename failure leaves the unlabeled file in place; an
/// unlabeled artifact is not data loss.
async fn label_artifact(session: &Session, saved_name: &str) -> Outcome {
    let output_dir = &session.config.output_dir;
    let label = match session
        .labeler
        .label(saved_name, &session.config.reference_date, output_dir)
    {
        Ok(label) => label,
        Err(err) => {
            warn!(
                filename = saved_name,
                error = %err,
                "labeling failed, keeping unlabeled file",
            );
            return Outcome::Saved {
                filename: saved_name.to_string(),
            };
        }
    };

    let labeled_name = filename::labeled(saved_name, &label.value);
    match tokio::fs::rename(output_dir.join(saved_name), output_dir.join(&labeled_name)).await {
        Ok(()) => Outcome::Saved {
            filename: labeled_name,
        },
        Err(err) => {
            warn!(
                filename = saved_name,
                error = %err,
                "label rename failed, keeping unlabeled file",
            );
            Outcome::Saved {
                filename: saved_name.to_string(),
            }
        }
    }
}
