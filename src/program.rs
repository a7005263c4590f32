//! Program driver: wires config, signals, sessions, and the orchestrator
//!
//! Single-keyword mode harvests into the output directory directly. Batch
//! mode reads keyword/reference-date pairs from an input file and harvests
//! each keyword into its own subdirectory with its own resumable session,
//! checkpointing after every keyword. An interrupt requests cooperative
//! shutdown: spawning stops, in-flight downloads drain, the checkpoint is
//! saved, and the process exits with success.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, bail};
use tokio::sync::watch;
use tracing::{info, warn};

use crate::harvester::cli::{Cli, parse_batch_line};
use crate::harvester::config::{AppConfig, SessionConfig};
use crate::harvester::filename::keyword_dir;
use crate::harvester::labeler::SubjectAgeLabeler;
use crate::harvester::orchestrator::{KeywordOutcome, Orchestrator};
use crate::harvester::session::Session;

pub struct Program {
    cli: Cli,
    app_config: AppConfig,
    shutdown_rx: watch::Receiver<bool>,
}

impl Program {
    pub fn new(cli: Cli, app_config: AppConfig) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        // Interrupt requests cooperative shutdown; workers are drained and
        // the checkpoint saved before exit.
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("interrupt received, finishing in-flight downloads");
                let _ = shutdown_tx.send(true);
            }
        });

        Self {
            cli,
            app_config,
            shutdown_rx,
        }
    }

    pub async fn run(self) -> anyhow::Result<()> {
        if let Some(keyword) = self.cli.keyword.clone() {
            let config = self.session_config(self.cli.reference_date.clone());
            self.harvest_keyword(&keyword, config).await
        } else if let Some(batch_file) = self.cli.batch_file.clone() {
            self.run_batch(&batch_file).await
        } else {
            bail!("either --keyword or --batch-file is required");
        }
    }

    /// Resolve the per-session settings: CLI options override the config
    /// file where they overlap.
    fn session_config(&self, reference_date: String) -> SessionConfig {
        let mut config = SessionConfig::from_app_config(&self.app_config, reference_date);
        if let Some(output_dir) = &self.cli.output_dir {
            config.output_dir = output_dir.clone();
        }
        if let Some(concurrency) = self.cli.concurrency {
            config.concurrency = concurrency;
        }
        config.limit = self.cli.limit;
        config.filter = self.cli.filter.clone();
        config
    }

    /// Harvest one keyword into one session, checkpointing at the end.
    async fn harvest_keyword(&self, keyword: &str, config: SessionConfig) -> anyhow::Result<()> {
        let session = Session::open(config, Arc::new(SubjectAgeLabeler))
            .context("failed to open harvest session")?;

        let mut orchestrator = Orchestrator::new(session.clone(), self.shutdown_rx.clone());
        let outcome = orchestrator.run_keyword(keyword).await;

        // The checkpoint is saved even when the crawl itself failed; work
        // completed so far must survive.
        session
            .save_checkpoint()
            .await
            .context("failed to save checkpoint")?;

        match outcome? {
            KeywordOutcome::NoResults => warn!(keyword, "finished with no results"),
            outcome => info!(keyword, ?outcome, "finished"),
        }
        Ok(())
    }

    /// Batch mode: one subdirectory and one resumable session per keyword.
    async fn run_batch(&self, batch_file: &Path) -> anyhow::Result<()> {
        let contents = std::fs::read_to_string(batch_file)
            .with_context(|| format!("couldn't open batch file {}", batch_file.display()))?;

        let output_root = self
            .cli
            .output_dir
            .clone()
            .unwrap_or_else(|| self.app_config.paths.output_directory.clone().into());

        for (keyword, reference_date) in contents.lines().filter_map(parse_batch_line) {
            if *self.shutdown_rx.borrow() {
                break;
            }

            let mut config = self.session_config(reference_date);
            config.output_dir = output_root.join(keyword_dir(&keyword));

            if let Err(err) = self.harvest_keyword(&keyword, config).await {
                // One bad keyword must not abort the batch.
                warn!(keyword = %keyword, error = %err, "keyword failed, continuing batch");
            }
        }
        Ok(())
    }
}
