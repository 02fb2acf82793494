//! Removal of generated index notes.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::instrument;
use vaultkeeper_core::AUTO_GENERATED_STATE_KEY;
use vaultkeeper_schema::Schema;
use vaultkeeper_vault::READ_ONLY_STATE;
use vaultkeeper_vault::prelude::*;

/// Deletes generated indexes under a path. Read-only indexes are kept.
pub struct IndexCleaner {
    schema: Arc<Schema>,
    store: NoteStore,
}

impl IndexCleaner {
    pub fn new(schema: Arc<Schema>, config: &AppConfig) -> Self {
        Self {
            schema,
            store: NoteStore::from_config(config),
        }
    }

    /// Remove every generated index under `root`. Notes that are not
    /// indexes are not counted.
    #[instrument(skip(self), name = "clean_indexes")]
    pub async fn clean_indexes(&self, root: &Path, dry_run: bool) -> BatchResult {
        let tracker = RunTracker::new();
        let mut result = BatchResult::new(dry_run, &tracker);

        let notes = match self.store.walk_notes(root) {
            Ok(notes) => notes,
            Err(e) => {
                result.record(FolderOutcome::from_error(root, &e));
                return result.finish(&tracker);
            }
        };

        for note in notes {
            if let Some(outcome) = self.clean_one(note, dry_run).await {
                result.record(outcome);
            }
        }

        let result = result.finish(&tracker);
        tracing::info!(
            run_id = %result.run_id,
            removed = result.processed,
            kept = result.skipped,
            failed = result.failed,
            "Index cleanup finished"
        );
        result
    }

    async fn clean_one(&self, note: PathBuf, dry_run: bool) -> Option<FolderOutcome> {
        let frontmatter = match self.store.read_note(&note).await {
            Ok(parsed) => parsed.frontmatter?,
            Err(e) => {
                tracing::debug!(note = %note.display(), error = %e, "Not inspecting unreadable note");
                return None;
            }
        };

        let template_type = frontmatter.template_type()?;
        if !self.schema.is_index_type(template_type) {
            return None;
        }

        if frontmatter.get_text(AUTO_GENERATED_STATE_KEY) == Some(READ_ONLY_STATE) {
            return Some(FolderOutcome::Skipped(format!("{}: read-only", note.display())));
        }

        if dry_run {
            return Some(FolderOutcome::Processed(Some(note)));
        }

        Some(match self.store.remove_file(&note).await {
            Ok(()) => {
                tracing::debug!(note = %note.display(), "Removed index");
                FolderOutcome::Processed(Some(note))
            }
            Err(e) => FolderOutcome::from_error(&note, &e),
        })
    }
}
