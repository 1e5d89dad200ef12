//! Markdesk CLI Binary
//!
//! Command-line interface for the Markdesk local Markdown workspace.

use anyhow::Context;
use clap::Parser;
use markdesk::config::ConfigLoader;
use markdesk::logging::init_logging;
use markdesk::tooling::cli::{Cli, CliContext};
use std::process;

fn main() {
    let cli = Cli::parse();
    match run(cli) {
        Ok(output) => print!("{}", output),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            process::exit(1);
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<String> {
    let mut config = ConfigLoader::load(cli.config.as_deref()).context("loading configuration")?;
    if let Some(level) = &cli.log_level {
        config.logging.level = level.clone();
    }
    if let Some(file) = &cli.log_file {
        config.logging.file = Some(file.clone());
    }
    init_logging(Some(&config.logging)).context("initializing logging")?;

    let data_dir = match &cli.data_dir {
        Some(dir) => dir.clone(),
        None => config.storage.resolve_data_dir()?,
    };

    let runtime = tokio::runtime::Runtime::new().context("starting async runtime")?;
    runtime.block_on(async {
        let mut context = CliContext::open(data_dir.clone(), &config)
            .await
            .with_context(|| format!("opening workspace at {}", data_dir.display()))?;
        let output = context.execute(&cli.command).await?;
        Ok(output)
    })
}
