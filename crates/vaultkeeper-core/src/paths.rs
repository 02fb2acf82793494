//! Path helpers: lexical normalization, root containment, and the
//! vault ↔ source-tree path mapping.

use crate::config::AppConfig;
use crate::error::{Error, Result};
use std::path::{Component, Path, PathBuf};

/// Lexically normalize a path, resolving `.` and `..` without touching the disk.
///
/// Relative paths that climb above their starting point are rejected.
pub fn normalize(path: &Path) -> Result<PathBuf> {
    let mut normalized = PathBuf::new();
    let mut depth = 0usize;

    for component in path.components() {
        match component {
            Component::Prefix(p) => normalized.push(p.as_os_str()),
            Component::RootDir => normalized.push(component),
            Component::CurDir => {}
            Component::ParentDir => {
                if depth == 0 {
                    return Err(Error::parse_error(format!(
                        "Path escapes its root: {}",
                        path.display()
                    )));
                }
                normalized.pop();
                depth -= 1;
            }
            Component::Normal(name) => {
                normalized.push(name);
                depth += 1;
            }
        }
    }

    Ok(normalized)
}

/// Express `path` relative to `root`, which must be absolute.
///
/// Absolute paths must live under `root`; relative paths are taken as
/// already relative to it. Either way the result never climbs out of `root`.
pub fn relative_to(root: &Path, path: &Path) -> Result<PathBuf> {
    if !root.is_absolute() {
        return Err(Error::config_error(format!(
            "root {} is not an absolute path",
            root.display()
        )));
    }

    if path.is_absolute() {
        let root_norm = normalize(root)?;
        let path_norm =
            normalize(path).map_err(|_| Error::path_outside_root(path, root))?;
        path_norm
            .strip_prefix(&root_norm)
            .map(Path::to_path_buf)
            .map_err(|_| Error::path_outside_root(path, root))
    } else {
        normalize(path).map_err(|_| Error::path_outside_root(path, root))
    }
}

/// Join a relative path under a root, refusing anything that would escape it
pub fn join_under(root: &Path, relative: &Path) -> Result<PathBuf> {
    let rel = relative_to(root, relative)?;
    if rel.as_os_str().is_empty() {
        Ok(root.to_path_buf())
    } else {
        Ok(root.join(rel))
    }
}

/// Vault-relative ↔ source-relative path mapping.
///
/// A vault path `vault_base/rest` maps to `source_base/rest` and back.
/// Paths outside the respective base are rejected with
/// [`Error::PathOutsideRoot`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathMapping {
    vault_root: PathBuf,
    source_root: PathBuf,
    vault_base: PathBuf,
    source_base: PathBuf,
}

impl PathMapping {
    /// Mapping between two roots with no base prefixes
    pub fn new(vault_root: impl Into<PathBuf>, source_root: impl Into<PathBuf>) -> Self {
        Self {
            vault_root: vault_root.into(),
            source_root: source_root.into(),
            vault_base: PathBuf::new(),
            source_base: PathBuf::new(),
        }
    }

    /// Add base-path prefixes trimmed from each side
    pub fn with_bases(mut self, vault_base: impl AsRef<Path>, source_base: impl AsRef<Path>) -> Result<Self> {
        self.vault_base = normalize(vault_base.as_ref())?;
        self.source_base = normalize(source_base.as_ref())?;
        Ok(self)
    }

    /// Build from configuration; requires a source root
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let source_root = config.require_source_root()?;
        let mapping = Self::new(&config.vault_root, source_root);
        let vault_base = config.vault_base.clone().unwrap_or_default();
        let source_base = config.source_base.clone().unwrap_or_default();
        mapping.with_bases(vault_base, source_base)
    }

    /// Vault root
    pub fn vault_root(&self) -> &Path {
        &self.vault_root
    }

    /// Source tree root
    pub fn source_root(&self) -> &Path {
        &self.source_root
    }

    /// Map a vault-relative path to its source-relative counterpart
    pub fn to_source(&self, vault_relative: &Path) -> Result<PathBuf> {
        let rel = normalize(vault_relative)
            .map_err(|_| Error::path_outside_root(vault_relative, &self.vault_root))?;
        let rest = rel
            .strip_prefix(&self.vault_base)
            .map_err(|_| Error::path_outside_root(vault_relative, self.vault_root.join(&self.vault_base)))?;
        Ok(rebase(&self.source_base, rest))
    }

    /// Map a source-relative path to its vault-relative counterpart
    pub fn to_vault(&self, source_relative: &Path) -> Result<PathBuf> {
        let rel = normalize(source_relative)
            .map_err(|_| Error::path_outside_root(source_relative, &self.source_root))?;
        let rest = rel.strip_prefix(&self.source_base).map_err(|_| {
            Error::path_outside_root(source_relative, self.source_root.join(&self.source_base))
        })?;
        Ok(rebase(&self.vault_base, rest))
    }

    /// Map an absolute or vault-relative vault path to an absolute source path
    pub fn source_path_for(&self, vault_path: &Path) -> Result<PathBuf> {
        let rel = relative_to(&self.vault_root, vault_path)?;
        let source_rel = self.to_source(&rel)?;
        Ok(rebase(&self.source_root, &source_rel))
    }

    /// Map an absolute or source-relative source path to an absolute vault path
    pub fn vault_path_for(&self, source_path: &Path) -> Result<PathBuf> {
        let rel = relative_to(&self.source_root, source_path)?;
        let vault_rel = self.to_vault(&rel)?;
        Ok(rebase(&self.vault_root, &vault_rel))
    }
}

fn rebase(base: &Path, rest: &Path) -> PathBuf {
    let mut out = base.to_path_buf();
    for component in rest.components() {
        out.push(component);
    }
    out
}
