//! Metadata enforcement over a note or a subtree of notes.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::instrument;
use vaultkeeper_schema::{FieldResolverRegistry, Schema};
use vaultkeeper_vault::prelude::*;

/// Batch counters plus the tag statistics of the run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetadataBatchResult {
    #[serde(flatten)]
    pub batch: BatchResult,
    pub stats: TagStats,
    /// Every schema warning raised, in walk order
    pub warnings: Vec<SchemaWarning>,
}

impl MetadataBatchResult {
    pub fn exit_code(&self) -> i32 {
        self.batch.exit_code()
    }
}

/// Runs [`TagProcessor`] over every note under a path
pub struct MetadataBatchProcessor {
    schema: Arc<Schema>,
    registry: Arc<FieldResolverRegistry>,
    config: Arc<AppConfig>,
    today: Option<NaiveDate>,
}

impl MetadataBatchProcessor {
    /// Build the resolver registry once for every batch this processor runs
    pub fn new(schema: Arc<Schema>, config: Arc<AppConfig>) -> Self {
        let registry = FieldResolverRegistry::from_schema(&schema, &config.level_names);
        Self {
            schema,
            registry: Arc::new(registry),
            config,
            today: None,
        }
    }

    /// Pin the date used by date resolvers
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    pub fn registry(&self) -> &FieldResolverRegistry {
        &self.registry
    }

    /// Process a single note, or every note of a folder subtree.
    ///
    /// Notes are handled one after another by a single [`TagProcessor`], whose
    /// statistics become part of the result.
    #[instrument(skip(self), name = "ensure_metadata")]
    pub async fn ensure_metadata(&self, path: &Path, dry_run: bool) -> MetadataBatchResult {
        let tracker = RunTracker::new();
        let mut batch = BatchResult::new(dry_run, &tracker);
        let mut warnings = Vec::new();

        let mut processor = TagProcessor::new(
            Arc::clone(&self.schema),
            Arc::clone(&self.registry),
            &self.config,
            ProcessingMode::from_dry_run(dry_run),
        );
        if let Some(today) = self.today {
            processor = processor.with_today(today);
        }

        let store = NoteStore::from_config(&self.config);
        let notes = match store.walk_notes(path) {
            Ok(notes) => notes,
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "Cannot walk notes");
                batch.record(FolderOutcome::from_error(path, &e));
                return MetadataBatchResult {
                    batch: batch.finish(&tracker),
                    stats: processor.into_stats(),
                    warnings,
                };
            }
        };

        for note in notes {
            let outcome = match processor.process_note(&note).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    tracing::warn!(note = %note.display(), error = %e, "Metadata processing failed");
                    batch.record(FolderOutcome::from_error(&note, &e));
                    continue;
                }
            };

            for rejected in &outcome.rejected {
                tracing::info!(note = %outcome.path.display(), tag = %rejected, "Rejected tag");
            }

            let malformed = outcome
                .warnings
                .iter()
                .any(|w| w.kind == WarningKind::MalformedFrontmatter);
            batch.record(if malformed {
                FolderOutcome::Skipped(format!("{}: malformed frontmatter", outcome.path.display()))
            } else if outcome.changed {
                FolderOutcome::Processed(Some(note.clone()))
            } else {
                FolderOutcome::Processed(None)
            });
            warnings.extend(outcome.warnings);
        }

        let batch = batch.finish(&tracker);
        let stats = processor.into_stats();
        tracing::info!(
            run_id = %batch.run_id,
            notes = stats.notes_scanned,
            modified = stats.notes_modified,
            rejected = stats.tags_rejected,
            warnings = stats.warnings,
            failed = batch.failed,
            "Metadata enforcement finished"
        );

        MetadataBatchResult {
            batch,
            stats,
            warnings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use vaultkeeper_schema::SchemaLoader;

    const SCHEMA: &str = r#"
reserved_tags: [video]
universal_fields: [date-created]
type_mapping:
  video: video-reference
template_types:
  video-reference:
    - title
    - name: course
      required: true
"#;

    async fn setup() -> (TempDir, MetadataBatchProcessor) {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        tokio::fs::create_dir_all(root.join("MBA/Finance")).await.unwrap();
        tokio::fs::write(root.join("MBA/Finance/a.md"), "---\ntags: [Video, junk]\n---\nA\n")
            .await
            .unwrap();
        tokio::fs::write(root.join("MBA/Finance/b.md"), "---\ndate-created: '2020-01-01'\n---\nB\n")
            .await
            .unwrap();
        tokio::fs::write(root.join("MBA/broken.md"), "---\n: : [\n---\n").await.unwrap();

        let config = AppConfig::builder(root).build().unwrap();
        let schema = SchemaLoader::parse(SCHEMA, Path::new("schema.yaml")).unwrap();
        let processor = MetadataBatchProcessor::new(Arc::new(schema), Arc::new(config))
            .with_today(NaiveDate::from_ymd_opt(2026, 3, 14).unwrap());
        (temp, processor)
    }

    #[tokio::test]
    async fn test_subtree_apply() {
        let (temp, processor) = setup().await;
        let result = processor.ensure_metadata(Path::new("MBA"), false).await;

        assert_eq!(result.batch.total_folders, 3);
        assert_eq!(result.batch.processed, 2);
        assert_eq!(result.batch.skipped, 1);
        assert_eq!(result.batch.outputs, vec![temp.path().join("MBA/Finance/a.md")]);
        assert_eq!(result.stats.notes_scanned, 3);
        assert_eq!(result.stats.tags_rejected, 1);
        assert_eq!(result.exit_code(), 0);

        let content = tokio::fs::read_to_string(temp.path().join("MBA/Finance/a.md"))
            .await
            .unwrap();
        assert!(content.contains("course: Finance"));
        assert!(content.contains("2026-03-14"));
        assert!(!content.contains("junk"));
    }

    #[tokio::test]
    async fn test_dry_run_leaves_files() {
        let (temp, processor) = setup().await;
        let note = temp.path().join("MBA/Finance/a.md");
        let before = tokio::fs::read_to_string(&note).await.unwrap();

        let result = processor.ensure_metadata(&note, true).await;
        assert!(result.batch.dry_run);
        assert_eq!(result.batch.outputs, vec![note.clone()]);
        assert_eq!(result.stats.tags_rejected, 1);
        assert_eq!(tokio::fs::read_to_string(&note).await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_warnings_collected() {
        let (_temp, processor) = setup().await;
        let result = processor.ensure_metadata(Path::new("MBA"), true).await;
        let kinds: Vec<_> = result.warnings.iter().map(|w| w.kind).collect();
        assert!(kinds.contains(&WarningKind::MalformedFrontmatter));
        assert_eq!(result.stats.warnings, result.warnings.len());
    }

    #[tokio::test]
    async fn test_missing_path_fails_batch() {
        let (_temp, processor) = setup().await;
        let result = processor.ensure_metadata(Path::new("Nowhere"), false).await;
        assert_eq!(result.batch.failed, 1);
        assert_eq!(result.exit_code(), 1);
    }

    #[tokio::test]
    async fn test_path_outside_vault_is_skipped() {
        let (_temp, processor) = setup().await;
        let outside = TempDir::new().unwrap();
        let note = outside.path().join("stray.md");
        tokio::fs::write(&note, "---\ntags: [junk]\n---\n").await.unwrap();

        let result = processor.ensure_metadata(&note, false).await;
        assert_eq!((result.batch.skipped, result.batch.failed), (1, 0));
        assert_eq!(result.exit_code(), 0);
        assert!(tokio::fs::read_to_string(&note).await.unwrap().contains("junk"));
    }
}
