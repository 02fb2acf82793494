//! Hierarchy inference from vault paths.
//!
//! A folder at `root/Program/Course/Class` has three levels:
//! `program=Program`, `course=Course`, `class=Class`. Segments deeper than the
//! configured level names are kept under [`EXTRA_LEVEL`].

use crate::config::{AppConfig, EXTRA_LEVEL};
use crate::error::Result;
use crate::paths::relative_to;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Level name reported for the vault root itself
pub const ROOT_LEVEL: &str = "main";

/// One named hierarchy level
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HierarchyLevel {
    pub name: String,
    pub value: String,
}

/// Ordered hierarchy levels for a folder or note
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HierarchyLevels {
    levels: Vec<HierarchyLevel>,
}

impl HierarchyLevels {
    /// Number of folders below the root
    pub fn depth(&self) -> usize {
        self.levels.len()
    }

    /// Whether this describes the root itself
    pub fn is_root(&self) -> bool {
        self.levels.is_empty()
    }

    /// Value of the first level with the given name
    pub fn get(&self, name: &str) -> Option<&str> {
        self.levels
            .iter()
            .find(|l| l.name == name)
            .map(|l| l.value.as_str())
    }

    /// Values retained under the extra bucket
    pub fn extras(&self) -> Vec<&str> {
        self.levels
            .iter()
            .filter(|l| l.name == EXTRA_LEVEL)
            .map(|l| l.value.as_str())
            .collect()
    }

    /// Deepest level, if any
    pub fn deepest(&self) -> Option<&HierarchyLevel> {
        self.levels.last()
    }

    /// Name of the deepest level, or [`ROOT_LEVEL`] at the root
    pub fn level_name(&self) -> &str {
        self.deepest().map(|l| l.name.as_str()).unwrap_or(ROOT_LEVEL)
    }

    /// Iterate levels top-most first
    pub fn iter(&self) -> impl Iterator<Item = &HierarchyLevel> {
        self.levels.iter()
    }
}

impl<'a> IntoIterator for &'a HierarchyLevels {
    type Item = &'a HierarchyLevel;
    type IntoIter = std::slice::Iter<'a, HierarchyLevel>;

    fn into_iter(self) -> Self::IntoIter {
        self.levels.iter()
    }
}

/// Infers hierarchy levels from paths. Pure: never touches the disk.
#[derive(Debug, Clone)]
pub struct MetadataHierarchyDetector {
    root: PathBuf,
    level_names: Vec<String>,
}

impl MetadataHierarchyDetector {
    /// Detector for the given root and level names (top-most first)
    pub fn new<I, S>(root: impl Into<PathBuf>, level_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            root: root.into(),
            level_names: level_names.into_iter().map(Into::into).collect(),
        }
    }

    /// Detector using the configured vault root and level names
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.vault_root.clone(), config.level_names.iter().cloned())
    }

    /// Configured root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Levels for a folder; the folder itself is the deepest level
    pub fn detect_folder(&self, path: &Path) -> Result<HierarchyLevels> {
        let rel = relative_to(&self.root, path)?;
        Ok(self.levels_for(&rel))
    }

    /// Levels for a note; the note's own file name is not a level
    pub fn detect_note(&self, path: &Path) -> Result<HierarchyLevels> {
        let rel = relative_to(&self.root, path)?;
        let folder = rel.parent().map(Path::to_path_buf).unwrap_or_default();
        Ok(self.levels_for(&folder))
    }

    fn levels_for(&self, rel: &Path) -> HierarchyLevels {
        let levels = rel
            .components()
            .enumerate()
            .map(|(i, segment)| HierarchyLevel {
                name: self
                    .level_names
                    .get(i)
                    .cloned()
                    .unwrap_or_else(|| EXTRA_LEVEL.to_string()),
                value: segment.as_os_str().to_string_lossy().into_owned(),
            })
            .collect();
        HierarchyLevels { levels }
    }
}
