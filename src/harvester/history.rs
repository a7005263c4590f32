//! Session download history: processed URLs and the content dedup index
//!
//! This module provides the shared mutable state of a harvest session:
//! 1. The ordered, append-only set of URLs that completed a full save cycle
//! 2. The dedup index mapping content fingerprints to owning filenames
//!
//! A `DownloadHistory` is only ever mutated while the session's write gate
//! (a `tokio::sync::Mutex` around it) is held, so the fingerprint-check then
//! commit sequence stays atomic across all workers.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::harvester::fingerprint::ContentFingerprint;

/// Processed-URL history plus the content dedup index for one output
/// directory.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct DownloadHistory {
    /// URLs that completed download + save, in commit order.
    processed: Vec<String>,

    /// Fingerprint of saved content -> filename that owns it.
    dedup: HashMap<ContentFingerprint, String>,

    /// Membership index over `processed`, rebuilt after deserialization.
    #[serde(skip)]
    processed_index: HashSet<String>,
}

impl DownloadHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild the membership index; must be called after deserializing.
    pub fn rebuild_index(&mut self) {
        self.processed_index = self.processed.iter().cloned().collect();
    }

    /// Whether a URL already completed a full save cycle.
    pub fn is_processed(&self, url: &str) -> bool {
        self.processed_index.contains(url)
    }

    /// Record a URL as fully processed. Call only after its bytes are on disk.
    pub fn mark_processed(&mut self, url: &str) {
        if self.processed_index.insert(url.to_string()) {
            self.processed.push(url.to_string());
        }
    }

    /// Number of URLs processed so far; compared against the global limit.
    pub fn processed_count(&self) -> usize {
        self.processed.len()
    }

    /// Commit-ordered processed URLs.
    pub fn processed_urls(&self) -> &[String] {
        &self.processed
    }

    /// Filename that already owns this content, if any.
    pub fn owner_of(&self, fingerprint: &ContentFingerprint) -> Option<&str> {
        self.dedup.get(fingerprint).map(String::as_str)
    }

    /// Register a fingerprint -> filename mapping.
    ///
    /// The index is append-only: once a fingerprint has an owner, later
    /// claims are ignored and the original owner is kept.
    pub fn claim(&mut self, fingerprint: ContentFingerprint, filename: String) {
        self.dedup.entry(fingerprint).or_insert(filename);
    }

    pub fn dedup_count(&self) -> usize {
        self.dedup.len()
    }
}
