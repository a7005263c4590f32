use anyhow::Context;
use clap::Parser;

use crate::harvester::cli::Cli;
use crate::harvester::config::AppConfig;
use crate::program::Program;

mod harvester;
mod program;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let app_config = AppConfig::load(&cli.config).context("failed to load config")?;

    // The guard keeps the non-blocking file writer alive until exit.
    let _guard = harvester::logging::init(&app_config).context("failed to initialize logging")?;

    Program::new(cli, app_config).run().await
}
