//! Command dispatch: each subcommand maps to one batch entry point.

use crate::cli::{Cli, Command};
use crate::output;
use serde::Serialize;
use std::sync::Arc;
use vaultkeeper_batch::prelude::*;
use vaultkeeper_schema::{Schema, SchemaLoader};

/// Exit code for schema and configuration failures
pub const FATAL_EXIT_CODE: i32 = 2;

/// Result of one command, ready for printing
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "command", rename_all = "kebab-case")]
pub enum Report {
    GenerateIndex(BatchResult),
    CleanIndex(BatchResult),
    EnsureMetadata(MetadataBatchResult),
    SyncDirs(SyncResult),
}

impl Report {
    /// `0` on success, `1` when any item failed
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::GenerateIndex(r) | Self::CleanIndex(r) => r.exit_code(),
            Self::EnsureMetadata(r) => r.exit_code(),
            Self::SyncDirs(r) => r.exit_code(),
        }
    }
}

/// Load the configuration file (if any), apply `--set` overrides and
/// validate. An unset vault root defaults to the working directory.
pub async fn load_config(cli: &Cli) -> Result<AppConfig> {
    let mut config = match &cli.config {
        Some(path) => AppConfig::load(path).await?,
        None => AppConfig::default(),
    };

    for assignment in &cli.overrides {
        config.apply_override(assignment)?;
    }

    let cwd = std::env::current_dir()?;
    if config.vault_root.as_os_str().is_empty() {
        config.vault_root = cwd.clone();
    }
    config.resolve_relative_to(&cwd)?;

    config.validate()?;
    Ok(config)
}

/// Schema named by the configuration
pub async fn load_schema(config: &AppConfig) -> Result<Arc<Schema>> {
    let path = config
        .schema_path
        .as_deref()
        .ok_or_else(|| Error::config_error("schema_path is not configured"))?;
    Ok(Arc::new(SchemaLoader::load(path).await?))
}

/// Run the selected command
pub async fn execute(command: &Command, config: Arc<AppConfig>) -> Result<Report> {
    tracing::debug!(command = command.name(), vault = %config.vault_root.display(), "Executing command");

    match command {
        Command::GenerateIndex {
            path,
            dry_run,
            force,
            recursive,
            template_types,
        } => {
            let schema = load_schema(&config).await?;
            let batch = VaultIndexBatchProcessor::new(schema, &config);
            let options = IndexBatchOptions {
                dry_run: *dry_run,
                template_types: (!template_types.is_empty()).then(|| template_types.clone()),
                force_overwrite: *force,
                recursive: *recursive,
            };
            Ok(Report::GenerateIndex(batch.generate_indexes(path, options).await))
        }
        Command::CleanIndex { path, dry_run } => {
            let schema = load_schema(&config).await?;
            let cleaner = IndexCleaner::new(schema, &config);
            Ok(Report::CleanIndex(cleaner.clean_indexes(path, *dry_run).await))
        }
        Command::EnsureMetadata { path, dry_run } => {
            let schema = load_schema(&config).await?;
            let processor = MetadataBatchProcessor::new(schema, Arc::clone(&config));
            Ok(Report::EnsureMetadata(processor.ensure_metadata(path, *dry_run).await))
        }
        Command::SyncDirs {
            path,
            source,
            dry_run,
            unidirectional,
            force,
        } => {
            let sync = VaultFolderSyncProcessor::new(Arc::clone(&config));
            let request = SyncRequest {
                source_subpath: source.clone(),
                vault_path: path.clone(),
                dry_run: *dry_run,
                bidirectional: !*unidirectional,
                force: *force,
            };
            Ok(Report::SyncDirs(sync.sync_directories(request).await?))
        }
    }
}

/// Execute, print the report to stdout and return the process exit code
pub async fn run(cli: &Cli, config: AppConfig) -> i32 {
    let report = match execute(&cli.command, Arc::new(config)).await {
        Ok(report) => report,
        Err(e) => {
            tracing::error!(command = cli.command.name(), error = %e, "Command aborted");
            eprintln!("error: {}", e);
            return FATAL_EXIT_CODE;
        }
    };

    match output::render(&report, cli.json) {
        Ok(text) => println!("{}", text),
        Err(e) => {
            eprintln!("error: {}", e);
            return FATAL_EXIT_CODE;
        }
    }

    report.exit_code()
}
