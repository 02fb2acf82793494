//! Command-line arguments.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Vaultkeeper - keeps a note vault in step with its source tree
#[derive(Parser, Debug, Clone)]
#[command(name = "vaultkeeper", author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (YAML)
    #[arg(short, long, global = true, env = "VAULTKEEPER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Override a configuration value, e.g. `--set source_root=/mnt/onedrive`
    #[arg(long = "set", value_name = "KEY=VALUE", global = true)]
    pub overrides: Vec<String>,

    /// Debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print the result as JSON instead of a summary
    #[arg(long, global = true)]
    pub json: bool,

    /// Log line format on stderr
    #[arg(long, value_enum, default_value_t = LogFormat::Text, global = true)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Generate folder index notes
    GenerateIndex {
        /// Folder, absolute or relative to the vault root
        path: PathBuf,

        /// Report what would be written without writing
        #[arg(long)]
        dry_run: bool,

        /// Replace existing indexes that are not read-only
        #[arg(long)]
        force: bool,

        /// Include every subfolder
        #[arg(short, long)]
        recursive: bool,

        /// Only folders whose index has this template type (repeatable)
        #[arg(long = "template-type", value_name = "TYPE")]
        template_types: Vec<String>,
    },

    /// Remove generated index notes
    CleanIndex {
        /// Folder or note, absolute or relative to the vault root
        path: PathBuf,

        #[arg(long)]
        dry_run: bool,
    },

    /// Normalize tags and fill schema fields
    EnsureMetadata {
        /// Note or folder, absolute or relative to the vault root
        path: PathBuf,

        #[arg(long)]
        dry_run: bool,
    },

    /// Mirror directory structure between the vault and the source tree
    SyncDirs {
        /// Vault folder to sync; defaults to the vault root
        path: Option<PathBuf>,

        /// Source folder relative to the source root, instead of the mapped one
        #[arg(long, value_name = "SUBPATH")]
        source: Option<PathBuf>,

        #[arg(long)]
        dry_run: bool,

        /// Do not create vault-only folders in the source tree
        #[arg(long)]
        unidirectional: bool,

        /// Treat missing roots as empty and create them
        #[arg(long)]
        force: bool,
    },
}

impl Command {
    /// Kebab-case command name
    pub fn name(&self) -> &'static str {
        match self {
            Self::GenerateIndex { .. } => "generate-index",
            Self::CleanIndex { .. } => "clean-index",
            Self::EnsureMetadata { .. } => "ensure-metadata",
            Self::SyncDirs { .. } => "sync-dirs",
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_generate_index() {
        let cli = Cli::try_parse_from([
            "vaultkeeper",
            "generate-index",
            "MBA",
            "--recursive",
            "--template-type",
            "course-index",
            "--template-type",
            "class-index",
        ])
        .unwrap();

        match cli.command {
            Command::GenerateIndex {
                path,
                recursive,
                template_types,
                dry_run,
                ..
            } => {
                assert_eq!(path, PathBuf::from("MBA"));
                assert!(recursive);
                assert!(!dry_run);
                assert_eq!(template_types, vec!["course-index", "class-index"]);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "vaultkeeper",
            "sync-dirs",
            "--unidirectional",
            "--set",
            "source_root=/mnt/onedrive",
            "--json",
            "--log-format",
            "json",
        ])
        .unwrap();

        assert!(cli.json);
        assert_eq!(cli.log_format, LogFormat::Json);
        assert_eq!(cli.overrides, vec!["source_root=/mnt/onedrive"]);
        assert_eq!(cli.command.name(), "sync-dirs");
    }

    #[test]
    fn test_path_is_required() {
        assert!(Cli::try_parse_from(["vaultkeeper", "ensure-metadata"]).is_err());
    }
}
