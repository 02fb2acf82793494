//! Configuration for vault and source-tree operations.
//!
//! [`AppConfig`] is loaded once per process (YAML file, then CLI overrides)
//! and passed explicitly to every processor. Overrides go through
//! [`ConfigKey`], a closed set of keys with typed setters.

use crate::error::{Error, Result};
use crate::paths::normalize;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Default hierarchy level names, top-most first
pub const DEFAULT_LEVEL_NAMES: &[&str] = &["program", "course", "class", "module", "lesson"];

/// Level name used for segments deeper than the configured level names
pub const EXTRA_LEVEL: &str = "extra";

/// Runtime configuration shared by every processor
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Root of the note vault
    pub vault_root: PathBuf,
    /// Root of the mirrored source tree
    pub source_root: Option<PathBuf>,
    /// Prefix trimmed from vault-relative paths before mapping
    pub vault_base: Option<PathBuf>,
    /// Prefix trimmed from source-relative paths before mapping
    pub source_base: Option<PathBuf>,
    /// Location of the metadata schema document
    pub schema_path: Option<PathBuf>,
    /// Hierarchy level names, index 0 is the top-most folder below the root
    pub level_names: Vec<String>,
    /// Directory names ignored by every walk
    pub excluded_dirs: BTreeSet<String>,
    /// Accept tags that are neither reserved nor prefixed
    pub allow_unknown_tags: bool,
    /// Upper bound on concurrent folder operations
    pub max_concurrency: usize,
    /// Default log filter when RUST_LOG is unset
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            vault_root: PathBuf::new(),
            source_root: None,
            vault_base: None,
            source_base: None,
            schema_path: None,
            level_names: DEFAULT_LEVEL_NAMES.iter().map(|s| s.to_string()).collect(),
            excluded_dirs: [".obsidian", ".git", ".trash", "node_modules"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            allow_unknown_tags: false,
            max_concurrency: 8,
            log_level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Create a config builder rooted at the given vault
    pub fn builder(vault_root: impl Into<PathBuf>) -> AppConfigBuilder {
        AppConfigBuilder::new(vault_root)
    }

    /// Validate the configuration shape (paths are checked by the processors)
    pub fn validate(&self) -> Result<()> {
        if self.vault_root.as_os_str().is_empty() {
            return Err(Error::config_error("vault_root must be set"));
        }

        if !self.vault_root.is_absolute() {
            return Err(Error::config_error(format!(
                "vault_root must be an absolute path, got '{}'",
                self.vault_root.display()
            )));
        }

        if let Some(source) = &self.source_root
            && !source.is_absolute()
        {
            return Err(Error::config_error(format!(
                "source_root must be an absolute path, got '{}'",
                source.display()
            )));
        }

        if self.max_concurrency == 0 {
            return Err(Error::config_error("max_concurrency must be at least 1"));
        }

        if self.level_names.is_empty() {
            return Err(Error::config_error("level_names cannot be empty"));
        }

        let unique: BTreeSet<_> = self.level_names.iter().collect();
        if unique.len() != self.level_names.len() {
            return Err(Error::config_error("level_names must be unique"));
        }

        if self.level_names.iter().any(|n| n == EXTRA_LEVEL) {
            return Err(Error::config_error(format!(
                "'{}' is reserved for levels deeper than level_names",
                EXTRA_LEVEL
            )));
        }

        Ok(())
    }

    /// Source root, or a configuration error when it is not set
    pub fn require_source_root(&self) -> Result<&Path> {
        self.source_root
            .as_deref()
            .ok_or_else(|| Error::config_error("source_root is not configured"))
    }

    /// Whether a directory name is excluded from walks
    pub fn is_excluded(&self, name: &str) -> bool {
        self.excluded_dirs.contains(name)
    }

    /// Apply a single `key=value` override
    pub fn apply_override(&mut self, assignment: &str) -> Result<()> {
        let (key, value) = assignment.split_once('=').ok_or_else(|| {
            Error::config_error(format!("Override '{}' is not of the form key=value", assignment))
        })?;
        let key: ConfigKey = key.trim().parse()?;
        key.apply(self, value.trim())
    }

    /// Load configuration from a YAML file.
    ///
    /// Relative paths in the file are resolved against the file's directory.
    pub async fn load(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            Error::config_error(format!("Failed to read config {}: {}", path.display(), e))
        })?;

        let mut config: AppConfig = serde_yaml::from_str(&content).map_err(|e| {
            Error::config_error(format!("Invalid config {}: {}", path.display(), e))
        })?;

        let file = std::path::absolute(path).map_err(|e| {
            Error::config_error(format!("Cannot resolve config path {}: {}", path.display(), e))
        })?;
        if let Some(base) = file.parent() {
            config.resolve_relative_to(base)?;
        }

        tracing::debug!(config = %path.display(), vault = %config.vault_root.display(), "Loaded configuration");
        Ok(config)
    }

    /// Anchor relative root and schema paths to `base`, which must be
    /// absolute. Base prefixes stay relative.
    pub fn resolve_relative_to(&mut self, base: &Path) -> Result<()> {
        let anchor = |p: &mut PathBuf| -> Result<()> {
            if p.is_relative() && !p.as_os_str().is_empty() {
                *p = normalize(&base.join(&*p))?;
            }
            Ok(())
        };
        anchor(&mut self.vault_root)?;
        if let Some(p) = self.source_root.as_mut() {
            anchor(p)?;
        }
        if let Some(p) = self.schema_path.as_mut() {
            anchor(p)?;
        }
        Ok(())
    }
}

/// Builder for AppConfig
pub struct AppConfigBuilder {
    config: AppConfig,
}

impl AppConfigBuilder {
    /// Create a new builder
    pub fn new(vault_root: impl Into<PathBuf>) -> Self {
        Self {
            config: AppConfig {
                vault_root: vault_root.into(),
                ..AppConfig::default()
            },
        }
    }

    /// Set the source tree root
    pub fn source_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.config.source_root = Some(root.into());
        self
    }

    /// Set the base-path prefixes trimmed during path mapping
    pub fn base_paths(mut self, vault_base: impl Into<PathBuf>, source_base: impl Into<PathBuf>) -> Self {
        self.config.vault_base = Some(vault_base.into());
        self.config.source_base = Some(source_base.into());
        self
    }

    /// Set the schema document path
    pub fn schema_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.schema_path = Some(path.into());
        self
    }

    /// Replace the hierarchy level names
    pub fn level_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.level_names = names.into_iter().map(Into::into).collect();
        self
    }

    /// Accept unknown free-form tags
    pub fn allow_unknown_tags(mut self, allow: bool) -> Self {
        self.config.allow_unknown_tags = allow;
        self
    }

    /// Bound the worker pool
    pub fn max_concurrency(mut self, workers: usize) -> Self {
        self.config.max_concurrency = workers;
        self
    }

    /// Build and validate
    pub fn build(self) -> Result<AppConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// Every configuration key that can be overridden at runtime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigKey {
    VaultRoot,
    SourceRoot,
    VaultBase,
    SourceBase,
    SchemaPath,
    LevelNames,
    ExcludedDirs,
    AllowUnknownTags,
    MaxConcurrency,
    LogLevel,
}

impl ConfigKey {
    /// All keys, in documentation order
    pub const ALL: [ConfigKey; 10] = [
        ConfigKey::VaultRoot,
        ConfigKey::SourceRoot,
        ConfigKey::VaultBase,
        ConfigKey::SourceBase,
        ConfigKey::SchemaPath,
        ConfigKey::LevelNames,
        ConfigKey::ExcludedDirs,
        ConfigKey::AllowUnknownTags,
        ConfigKey::MaxConcurrency,
        ConfigKey::LogLevel,
    ];

    /// Canonical key name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::VaultRoot => "vault_root",
            Self::SourceRoot => "source_root",
            Self::VaultBase => "vault_base",
            Self::SourceBase => "source_base",
            Self::SchemaPath => "schema_path",
            Self::LevelNames => "level_names",
            Self::ExcludedDirs => "excluded_dirs",
            Self::AllowUnknownTags => "allow_unknown_tags",
            Self::MaxConcurrency => "max_concurrency",
            Self::LogLevel => "log_level",
        }
    }

    /// Parse `value` and store it in `config`
    pub fn apply(self, config: &mut AppConfig, value: &str) -> Result<()> {
        match self {
            Self::VaultRoot => config.vault_root = PathBuf::from(value),
            Self::SourceRoot => config.source_root = optional_path(value),
            Self::VaultBase => config.vault_base = optional_path(value),
            Self::SourceBase => config.source_base = optional_path(value),
            Self::SchemaPath => config.schema_path = optional_path(value),
            Self::LevelNames => config.level_names = split_list(value),
            Self::ExcludedDirs => config.excluded_dirs = split_list(value).into_iter().collect(),
            Self::AllowUnknownTags => config.allow_unknown_tags = parse_bool(self, value)?,
            Self::MaxConcurrency => {
                config.max_concurrency = value.parse().map_err(|_| {
                    Error::config_error(format!("{} expects a positive integer, got '{}'", self, value))
                })?
            }
            Self::LogLevel => config.log_level = value.to_string(),
        }
        Ok(())
    }
}

impl FromStr for ConfigKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        Self::ALL
            .iter()
            .copied()
            .find(|k| k.as_str() == normalized)
            .ok_or_else(|| {
                let known: Vec<_> = Self::ALL.iter().map(|k| k.as_str()).collect();
                Error::config_error(format!(
                    "Unknown config key '{}'. Valid keys: {}",
                    s,
                    known.join(", ")
                ))
            })
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn optional_path(value: &str) -> Option<PathBuf> {
    if value.is_empty() {
        None
    } else {
        Some(PathBuf::from(value))
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_bool(key: ConfigKey, value: &str) -> Result<bool> {
    match value.to_lowercase().as_str() {
        "true" | "yes" | "1" | "on" => Ok(true),
        "false" | "no" | "0" | "off" => Ok(false),
        _ => Err(Error::config_error(format!(
            "{} expects a boolean, got '{}'",
            key, value
        ))),
    }
}
