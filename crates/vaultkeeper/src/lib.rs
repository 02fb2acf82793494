//! # Vaultkeeper
//!
//! Command-line front end. Parses arguments, loads configuration and the
//! metadata schema, runs one batch operation and prints its result.
//!
//! ```text
//! vaultkeeper --config vaultkeeper.yaml generate-index MBA --recursive
//! vaultkeeper --config vaultkeeper.yaml ensure-metadata MBA/Finance --dry-run
//! vaultkeeper --config vaultkeeper.yaml sync-dirs --unidirectional
//! ```
//!
//! Exit codes: `0` success, `1` when any folder or note failed, `2` when
//! configuration or schema loading aborted the run.

pub mod cli;
pub mod commands;
pub mod logging;
pub mod output;

pub use cli::{Cli, Command, LogFormat};
pub use commands::{FATAL_EXIT_CODE, Report, execute, load_config, run};
