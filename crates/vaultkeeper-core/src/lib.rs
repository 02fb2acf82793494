//! # Vaultkeeper Core
//!
//! Core data models, error types, configuration, path mapping and hierarchy
//! inference shared by every Vaultkeeper crate.
//!
//! ## Core Modules
//!
//! - [`config`] - Runtime configuration and typed override keys
//! - [`error`] - Error taxonomy and Result alias
//! - [`hierarchy`] - Hierarchy levels inferred from vault paths
//! - [`models`] - Frontmatter maps and batch/sync result records
//! - [`paths`] - Lexical path helpers and vault ↔ source mapping
//! - [`validation`] - Non-fatal schema warnings
//! - [`utils`] - Run tracking and JSON rendering
//!
//! ## Usage
//!
//! ```
//! use vaultkeeper_core::prelude::*;
//! use std::path::Path;
//!
//! let detector = MetadataHierarchyDetector::new("/vault", ["program", "course"]);
//! let levels = detector.detect_folder(Path::new("/vault/MBA/Finance")).unwrap();
//! assert_eq!(levels.get("course"), Some("Finance"));
//!
//! let mapping = PathMapping::new("/vault", "/onedrive");
//! let source = mapping.source_path_for(Path::new("/vault/MBA")).unwrap();
//! assert_eq!(source, Path::new("/onedrive/MBA"));
//! ```

pub mod config;
pub mod error;
pub mod hierarchy;
pub mod models;
pub mod paths;
pub mod utils;
pub mod validation;

pub use config::{AppConfig, AppConfigBuilder, ConfigKey, DEFAULT_LEVEL_NAMES, EXTRA_LEVEL};
pub use error::{Error, Result};
pub use hierarchy::{HierarchyLevel, HierarchyLevels, MetadataHierarchyDetector, ROOT_LEVEL};
pub use models::*;
pub use paths::PathMapping;
pub use utils::{RunTracker, to_json_string};
pub use validation::{SchemaWarning, WarningKind};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::{AppConfig, ConfigKey};
    pub use crate::error::{Error, Result};
    pub use crate::hierarchy::{HierarchyLevels, MetadataHierarchyDetector};
    pub use crate::models::{
        BatchResult, FieldValue, FolderOutcome, FrontmatterMap, SyncOutcome, SyncResult,
    };
    pub use crate::paths::PathMapping;
    pub use crate::utils::RunTracker;
    pub use crate::validation::{SchemaWarning, WarningKind};
}
