//! Fetch orchestration: paginate the backend, spawn bounded workers
//!
//! The orchestrator pages through the search backend for a keyword and
//! spawns one download worker per new candidate URL into a `JoinSet`. A pool
//! slot is acquired *before* spawning, so admission blocks precisely at the
//! concurrency bound instead of the discovery loop outrunning the pool.
//! Termination: the backend repeats its tail result, returns zero results,
//! the global limit is reached, or shutdown is requested.

use std::collections::HashSet;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use crate::harvester::search::{SearchClient, SearchError};
use crate::harvester::session::Session;
use crate::harvester::worker;

/// Error types for the orchestration loop
#[derive(Error, Debug)]
pub enum OrchestratorError {
    #[error("Search error: {0}")]
    Search(#[from] SearchError),
}

/// Result type for orchestration operations
pub type OrchestratorResult<T> = Result<T, OrchestratorError>;

/// How a keyword run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeywordOutcome {
    /// The backend repeated its tail result or stopped returning new pages.
    Exhausted,
    /// The backend returned zero results for the keyword; non-fatal.
    NoResults,
    /// The global processed-count limit was reached.
    LimitReached,
    /// Shutdown was requested; spawning stopped and in-flight work drained.
    Cancelled,
}

/// Pages the backend for one session and drives the worker pool.
pub struct Orchestrator {
    session: Arc<Session>,
    search: SearchClient,
    shutdown: watch::Receiver<bool>,
}

impl Orchestrator {
    pub fn new(session: Arc<Session>, shutdown: watch::Receiver<bool>) -> Self {
        let search = SearchClient::new(session.client.clone(), session.config.filter.clone());
        Self {
            session,
            search,
            shutdown,
        }
    }

    /// Replace the search client; used by tests that stand in for the
    /// backend.
    pub fn with_search(mut self, search: SearchClient) -> Self {
        self.search = search;
        self
    }

    /// Crawl one keyword to completion.
    ///
    /// Returns after all spawned workers have drained, so the session
    /// history is stable when this resolves.
    pub async fn run_keyword(&mut self, keyword: &str) -> OrchestratorResult<KeywordOutcome> {
        let mut shutdown = self.shutdown.clone();
        let mut offset = 0usize;
        let mut last_tail: Option<String> = None;
        let mut scheduled: HashSet<String> = HashSet::new();
        let mut tasks: JoinSet<worker::Outcome> = JoinSet::new();

        let outcome = 'pages: loop {
            if *shutdown.borrow() {
                break KeywordOutcome::Cancelled;
            }
            if self.session.limit_reached().await {
                break KeywordOutcome::LimitReached;
            }

            let links = tokio::select! {
                _ = shutdown.wait_for(|stop| *stop) => break KeywordOutcome::Cancelled,
                page = self.search.page(keyword, offset) => page?,
            };

            if links.is_empty() {
                if scheduled.is_empty() {
                    warn!(keyword, "no search results");
                    break KeywordOutcome::NoResults;
                }
                break KeywordOutcome::Exhausted;
            }

            // The backend signals exhaustion by repeating its tail result.
            if last_tail.as_deref() == links.last().map(String::as_str) {
                break KeywordOutcome::Exhausted;
            }

            let page_len = links.len();
            for link in &links {
                if self.session.limit_reached().await {
                    break 'pages KeywordOutcome::LimitReached;
                }
                // Never respawn a worker for a link already scheduled in
                // this run or completed in an earlier session.
                if !scheduled.insert(link.clone()) {
                    continue;
                }
                if self.session.history.lock().await.is_processed(link) {
                    continue;
                }

                let slot = tokio::select! {
                    _ = shutdown.wait_for(|stop| *stop) => break 'pages KeywordOutcome::Cancelled,
                    slot = self.session.pool.admit() => slot,
                };
                tasks.spawn(worker::run(self.session.clone(), link.clone(), slot));
            }

            last_tail = links.last().cloned();
            offset += page_len;
        };

        // Drain in-flight workers (bounded by the pool size) before
        // reporting, so cancellation never races the byte writes.
        while let Some(joined) = tasks.join_next().await {
            if let Err(err) = joined {
                error!(keyword, error = %err, "worker task panicked");
            }
        }

        info!(
            keyword,
            outcome = ?outcome,
            processed = self.session.history.lock().await.processed_count(),
            "keyword finished",
        );
        Ok(outcome)
    }
}
