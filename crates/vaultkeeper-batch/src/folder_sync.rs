//! Directory structure synchronization between the vault and the source tree.
//!
//! Only directory existence is mirrored. Source-only directories are always
//! created in the vault; vault-only directories are pushed to the source tree
//! only by a bidirectional run.

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use std::collections::BTreeSet;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::instrument;
use vaultkeeper_core::paths::join_under;
use vaultkeeper_core::prelude::*;
use walkdir::WalkDir;

/// Creates directories. The seam between the sync planner and the disk.
#[async_trait]
pub trait DirectoryCreator: Send + Sync {
    /// Create `path` and any missing parents; succeed if it already exists
    async fn create_dir(&self, path: &Path) -> io::Result<()>;
}

/// [`DirectoryCreator`] backed by the local file system
#[derive(Debug, Clone, Copy, Default)]
pub struct FsDirectoryCreator;

#[async_trait]
impl DirectoryCreator for FsDirectoryCreator {
    async fn create_dir(&self, path: &Path) -> io::Result<()> {
        match tokio::fs::create_dir_all(path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                match tokio::fs::metadata(path).await {
                    Ok(meta) if meta.is_dir() => Ok(()),
                    _ => Err(e),
                }
            }
            Err(e) => Err(e),
        }
    }
}

/// One synchronization run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncRequest {
    /// Source directory, relative to the source root; overrides the mapped path
    pub source_subpath: Option<PathBuf>,
    /// Vault directory to sync (absolute or vault-relative); defaults to the root
    pub vault_path: Option<PathBuf>,
    pub dry_run: bool,
    /// Also create vault-only directories in the source tree
    pub bidirectional: bool,
    /// Treat missing roots as empty instead of failing
    pub force: bool,
}

impl Default for SyncRequest {
    fn default() -> Self {
        Self {
            source_subpath: None,
            vault_path: None,
            dry_run: false,
            bidirectional: true,
            force: false,
        }
    }
}

/// Planned action for one relative directory
enum SyncAction {
    Done(SyncOutcome),
    CreateInVault(PathBuf),
    CreateInSource(PathBuf),
}

/// Mirrors directory structure between vault and source tree
pub struct VaultFolderSyncProcessor {
    config: Arc<AppConfig>,
    creator: Arc<dyn DirectoryCreator>,
}

impl VaultFolderSyncProcessor {
    pub fn new(config: Arc<AppConfig>) -> Self {
        Self {
            config,
            creator: Arc::new(FsDirectoryCreator),
        }
    }

    /// Replace the directory creator
    pub fn with_creator(mut self, creator: Arc<dyn DirectoryCreator>) -> Self {
        self.creator = creator;
        self
    }

    /// Synchronize one vault directory with its source counterpart.
    ///
    /// Fails only on configuration problems; per-directory creation failures
    /// are counted in the result.
    #[instrument(skip(self), name = "sync_directories")]
    pub async fn sync_directories(&self, request: SyncRequest) -> Result<SyncResult> {
        let tracker = RunTracker::new();
        let mapping = PathMapping::from_config(&self.config)?;

        if !request.force {
            ensure_root_exists("vault_root", mapping.vault_root()).await?;
            ensure_root_exists("source_root", mapping.source_root()).await?;
        }

        let vault_dir = match &request.vault_path {
            Some(path) => join_under(mapping.vault_root(), path)?,
            None => mapping.vault_root().to_path_buf(),
        };
        let source_dir = match &request.source_subpath {
            Some(sub) => join_under(mapping.source_root(), sub)?,
            None => mapping.source_path_for(&vault_dir)?,
        };

        tracing::info!(
            vault = %vault_dir.display(),
            source = %source_dir.display(),
            dry_run = request.dry_run,
            bidirectional = request.bidirectional,
            "Synchronizing directories"
        );

        let vault_tree = self.directory_tree(&vault_dir);
        let source_tree = self.directory_tree(&source_dir);

        let mut result = SyncResult::new(request.dry_run, &tracker);
        let mut creations = Vec::new();

        for rel in vault_tree.union(&source_tree) {
            let action = match (vault_tree.contains(rel), source_tree.contains(rel)) {
                (true, true) => SyncAction::Done(SyncOutcome::Synchronized),
                (true, false) if request.bidirectional => SyncAction::CreateInSource(under(&source_dir, rel)),
                (true, false) => SyncAction::Done(SyncOutcome::Skipped(under(&vault_dir, rel))),
                _ => SyncAction::CreateInVault(under(&vault_dir, rel)),
            };

            match action {
                SyncAction::Done(outcome) => result.record(outcome),
                SyncAction::CreateInVault(path) if request.dry_run => {
                    result.record(SyncOutcome::CreatedInVault(path))
                }
                SyncAction::CreateInSource(path) if request.dry_run => {
                    result.record(SyncOutcome::CreatedInSource(path))
                }
                create => creations.push(create),
            }
        }

        let mut outcomes = stream::iter(creations)
            .map(|action| self.create(action))
            .buffer_unordered(self.config.max_concurrency.max(1));

        while let Some(outcome) = outcomes.next().await {
            result.record(outcome);
        }

        let result = result.finish(&tracker);
        tracing::info!(
            run_id = %result.run_id,
            synchronized = result.synchronized,
            created_in_vault = result.created_in_vault,
            created_in_source = result.created_in_source,
            skipped = result.skipped,
            failed = result.failed,
            duration_ms = result.duration_ms,
            "Directory sync finished"
        );
        Ok(result)
    }

    async fn create(&self, action: SyncAction) -> SyncOutcome {
        let (path, in_vault) = match action {
            SyncAction::Done(outcome) => return outcome,
            SyncAction::CreateInVault(path) => (path, true),
            SyncAction::CreateInSource(path) => (path, false),
        };

        match self.creator.create_dir(&path).await {
            Ok(()) => {
                tracing::debug!(dir = %path.display(), in_vault, "Created directory");
                if in_vault {
                    SyncOutcome::CreatedInVault(path)
                } else {
                    SyncOutcome::CreatedInSource(path)
                }
            }
            Err(e) => {
                tracing::warn!(dir = %path.display(), error = %e, "Directory creation failed");
                SyncOutcome::Failed(path, e.to_string())
            }
        }
    }

    /// Relative paths of every directory under `dir`, `dir` itself included.
    /// A missing directory is an empty tree.
    fn directory_tree(&self, dir: &Path) -> BTreeSet<PathBuf> {
        if !dir.is_dir() {
            return BTreeSet::new();
        }

        WalkDir::new(dir)
            .into_iter()
            .filter_entry(|e| {
                e.depth() == 0
                    || !e
                        .file_name()
                        .to_str()
                        .is_some_and(|name| self.config.is_excluded(name) || name.starts_with('.'))
            })
            .filter_map(|entry| match entry {
                Ok(e) => Some(e),
                Err(err) => {
                    tracing::warn!(error = %err, "Skipping unreadable directory entry");
                    None
                }
            })
            .filter(|e| e.file_type().is_dir())
            .filter_map(|e| e.path().strip_prefix(dir).ok().map(Path::to_path_buf))
            .collect()
    }
}

async fn ensure_root_exists(key: &str, root: &Path) -> Result<()> {
    match tokio::fs::metadata(root).await {
        Ok(meta) if meta.is_dir() => Ok(()),
        _ => Err(Error::config_error(format!(
            "{} '{}' does not exist (use --force to create it)",
            key,
            root.display()
        ))),
    }
}

fn under(base: &Path, rel: &Path) -> PathBuf {
    if rel.as_os_str().is_empty() {
        base.to_path_buf()
    } else {
        base.join(rel)
    }
}
