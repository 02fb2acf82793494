//! Vaultkeeper CLI

use anyhow::Context;
use clap::Parser;
use vaultkeeper::{Cli, FATAL_EXIT_CODE, commands, logging};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match commands::load_config(&cli).await {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {}", e);
            std::process::exit(FATAL_EXIT_CODE);
        }
    };

    logging::init(cli.verbose, &config.log_level, cli.log_format)
        .map_err(anyhow::Error::msg)
        .context("Failed to initialize logging")?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        command = cli.command.name(),
        vault = %config.vault_root.display(),
        "Vaultkeeper starting"
    );

    let code = commands::run(&cli, config).await;
    std::process::exit(code);
}
