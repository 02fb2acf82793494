//! Note storage: path resolution, frontmatter-only reads/writes, folder
//! inventories and subtree walks.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::instrument;
use vaultkeeper_core::paths::{join_under, relative_to};
use vaultkeeper_core::prelude::*;
use vaultkeeper_parser::ParsedNote;
use walkdir::WalkDir;

/// Extension of note files
pub const NOTE_EXTENSION: &str = "md";

/// Whether a path names a markdown note
pub fn is_note(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(NOTE_EXTENSION))
}

/// A note found in a folder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteEntry {
    /// Absolute path
    pub path: PathBuf,
    /// File stem, used as the link target
    pub name: String,
    /// Declared `template-type`, if readable
    pub template_type: Option<String>,
}

/// Immediate contents of one folder, sorted by name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FolderInventory {
    pub folder: PathBuf,
    pub subfolders: Vec<String>,
    pub notes: Vec<NoteEntry>,
}

/// Reads and writes notes under a vault root
#[derive(Debug, Clone)]
pub struct NoteStore {
    vault_root: PathBuf,
    excluded_dirs: BTreeSet<String>,
}

impl NoteStore {
    /// Store rooted at `vault_root`
    pub fn new(vault_root: impl Into<PathBuf>) -> Self {
        Self {
            vault_root: vault_root.into(),
            excluded_dirs: BTreeSet::new(),
        }
    }

    /// Store using the configured vault root and exclusions
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            vault_root: config.vault_root.clone(),
            excluded_dirs: config.excluded_dirs.clone(),
        }
    }

    /// Vault root
    pub fn vault_root(&self) -> &Path {
        &self.vault_root
    }

    /// Absolute path for an absolute or vault-relative path under the root
    pub fn resolve(&self, path: &Path) -> Result<PathBuf> {
        join_under(&self.vault_root, path)
    }

    /// Vault-relative form of a path under the root
    pub fn relative(&self, path: &Path) -> Result<PathBuf> {
        relative_to(&self.vault_root, path)
    }

    /// Whether a directory name is excluded from walks
    pub fn is_excluded(&self, name: &str) -> bool {
        self.excluded_dirs.contains(name)
    }

    /// Read a note's raw content
    #[instrument(skip(self), fields(file = ?path), name = "note_read")]
    pub async fn read_raw(&self, path: &Path) -> Result<String> {
        let full = self.resolve(path)?;
        tokio::fs::read_to_string(&full).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::file_not_found(&full)
            } else {
                Error::io(e)
            }
        })
    }

    /// Read and split a note
    pub async fn read_note(&self, path: &Path) -> Result<ParsedNote> {
        let content = self.read_raw(path).await?;
        vaultkeeper_parser::split(&content)
    }

    /// Replace a note's frontmatter, keeping `body` byte for byte
    pub async fn write_note(&self, path: &Path, frontmatter: &FrontmatterMap, body: &str) -> Result<()> {
        let content = vaultkeeper_parser::render(frontmatter, body)?;
        self.write_file(path, &content).await
    }

    /// Write file to disk atomically
    #[instrument(skip(self, content), fields(file = ?path, size = content.len()), name = "note_write")]
    pub async fn write_file(&self, path: &Path, content: &str) -> Result<()> {
        let full = self.resolve(path)?;

        if let Some(parent) = full.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| Error::folder_io(parent, e))?;
        }

        // Write to temp file first
        let temp_path = full.with_extension(format!("{}.tmp", NOTE_EXTENSION));
        tokio::fs::write(&temp_path, content).await.map_err(Error::io)?;

        // Atomic rename
        if let Err(e) = tokio::fs::rename(&temp_path, &full).await {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(Error::io(e));
        }

        tracing::debug!(file = %full.display(), "Wrote note");
        Ok(())
    }

    /// Delete a file under the root
    pub async fn remove_file(&self, path: &Path) -> Result<()> {
        let full = self.resolve(path)?;
        tokio::fs::remove_file(&full).await.map_err(Error::io)
    }

    /// List a folder's subfolders and notes, reading each note's template type
    #[instrument(skip(self), fields(folder = ?folder), name = "folder_inventory")]
    pub async fn folder_inventory(&self, folder: &Path) -> Result<FolderInventory> {
        let full = self.resolve(folder)?;
        let mut entries = tokio::fs::read_dir(&full)
            .await
            .map_err(|e| Error::folder_io(&full, e))?;

        let mut inventory = FolderInventory {
            folder: full.clone(),
            ..Default::default()
        };

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| Error::folder_io(&full, e))?
        {
            let path = entry.path();
            let name = entry.file_name().to_string_lossy().into_owned();
            let file_type = entry.file_type().await.map_err(|e| Error::folder_io(&path, e))?;

            if file_type.is_dir() {
                if !self.is_excluded(&name) && !name.starts_with('.') {
                    inventory.subfolders.push(name);
                }
            } else if is_note(&path) {
                let template_type = match self.read_note(&path).await {
                    Ok(note) => note
                        .frontmatter
                        .and_then(|fm| fm.template_type().map(str::to_string)),
                    Err(e) => {
                        tracing::warn!(file = %path.display(), error = %e, "Unreadable note frontmatter");
                        None
                    }
                };
                let stem = path
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_default();
                inventory.notes.push(NoteEntry {
                    path,
                    name: stem,
                    template_type,
                });
            }
        }

        inventory.subfolders.sort();
        inventory.notes.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(inventory)
    }

    /// Folders of a subtree, depth-first with parents before children.
    ///
    /// Without `recursive` only `root` itself is returned.
    pub fn walk_folders(&self, root: &Path, recursive: bool) -> Result<Vec<PathBuf>> {
        let full = self.resolve(root)?;
        if !full.is_dir() {
            return Err(Error::folder_io(
                &full,
                std::io::Error::new(std::io::ErrorKind::NotFound, "not a directory"),
            ));
        }

        if !recursive {
            return Ok(vec![full]);
        }

        let folders = WalkDir::new(&full)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !self.skip_entry(e))
            .filter_map(|entry| match entry {
                Ok(e) => Some(e),
                Err(err) => {
                    tracing::warn!(error = %err, "Skipping unreadable entry");
                    None
                }
            })
            .filter(|e| e.file_type().is_dir())
            .map(|e| e.into_path())
            .collect();
        Ok(folders)
    }

    /// Notes under a path: the note itself, or every note in the subtree
    pub fn walk_notes(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let full = self.resolve(path)?;
        if full.is_file() {
            return Ok(if is_note(&full) { vec![full] } else { Vec::new() });
        }
        if !full.is_dir() {
            return Err(Error::file_not_found(&full));
        }

        let notes = WalkDir::new(&full)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !self.skip_entry(e))
            .filter_map(|entry| entry.ok())
            .filter(|e| e.file_type().is_file() && is_note(e.path()))
            .map(|e| e.into_path())
            .collect();
        Ok(notes)
    }

    fn skip_entry(&self, entry: &walkdir::DirEntry) -> bool {
        entry.file_type().is_dir()
            && entry
                .file_name()
                .to_str()
                .is_some_and(|name| self.is_excluded(name) || name.starts_with('.'))
    }
}
