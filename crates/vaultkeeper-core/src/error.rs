//! Error types for Vaultkeeper.
//!
//! All errors in the system are represented by the [`Error`] enum.
//! Schema and configuration errors are fatal for a run; path and folder
//! errors are per-item and are folded into batch results by the callers.

use std::io;
use std::path::PathBuf;
use thiserror::Error as ThisError;

/// The core error type for all Vaultkeeper operations.
#[derive(ThisError, Debug)]
pub enum Error {
    /// File system error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Schema document missing, unparsable, or incomplete. Aborts the run.
    #[error("Failed to load schema {path}: {reason}")]
    SchemaLoad { path: PathBuf, reason: String },

    /// Path does not live under the configured root
    #[error("Path {path} is outside root {root}")]
    PathOutsideRoot { path: PathBuf, root: PathBuf },

    /// Folder-level I/O failure (permission, lock, disk)
    #[error("Folder operation failed for {path}: {source}")]
    FolderIo {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// File not found
    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    /// Frontmatter or note parse error
    #[error("Parse error: {reason}")]
    ParseError { reason: String },

    /// Invalid configuration
    #[error("Configuration error: {reason}")]
    ConfigError { reason: String },

    /// Generic unclassified error
    #[error("Error: {0}")]
    Other(String),
}

/// Convenient Result type alias
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create an IO error
    pub fn io(err: io::Error) -> Self {
        Error::Io(err)
    }

    /// Create a schema load error
    pub fn schema_load(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Error::SchemaLoad {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a path-outside-root error
    pub fn path_outside_root(path: impl Into<PathBuf>, root: impl Into<PathBuf>) -> Self {
        Error::PathOutsideRoot {
            path: path.into(),
            root: root.into(),
        }
    }

    /// Create a folder I/O error
    pub fn folder_io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::FolderIo {
            path: path.into(),
            source,
        }
    }

    /// Create a file not found error
    pub fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Error::FileNotFound { path: path.into() }
    }

    /// Create a parse error
    pub fn parse_error(reason: impl Into<String>) -> Self {
        Error::ParseError {
            reason: reason.into(),
        }
    }

    /// Create a configuration error
    pub fn config_error(reason: impl Into<String>) -> Self {
        Error::ConfigError {
            reason: reason.into(),
        }
    }

    /// Create a generic error
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }

    /// Whether this error aborts the whole run rather than a single item
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::SchemaLoad { .. } | Error::ConfigError { .. })
    }
}
