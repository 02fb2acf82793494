//! Index generation over a folder subtree.

use futures::stream::{self, StreamExt};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::instrument;
use vaultkeeper_schema::Schema;
use vaultkeeper_vault::prelude::*;

/// Options for [`VaultIndexBatchProcessor::generate_indexes`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexBatchOptions {
    pub dry_run: bool,
    /// Only folders whose index template type is listed are processed
    pub template_types: Option<Vec<String>>,
    pub force_overwrite: bool,
    /// Walk the whole subtree instead of the root folder alone
    pub recursive: bool,
}

impl IndexBatchOptions {
    fn index_options(&self) -> IndexOptions {
        IndexOptions {
            dry_run: self.dry_run,
            force_overwrite: self.force_overwrite,
        }
    }

    fn accepts(&self, template_type: &str) -> bool {
        self.template_types
            .as_ref()
            .is_none_or(|types| types.iter().any(|t| t == template_type))
    }
}

/// Runs [`VaultIndexProcessor`] on every folder of a subtree
pub struct VaultIndexBatchProcessor {
    processor: VaultIndexProcessor,
    max_concurrency: usize,
}

impl VaultIndexBatchProcessor {
    pub fn new(schema: Arc<Schema>, config: &AppConfig) -> Self {
        Self::from_processor(VaultIndexProcessor::new(schema, config), config.max_concurrency)
    }

    pub fn from_processor(processor: VaultIndexProcessor, max_concurrency: usize) -> Self {
        Self {
            processor,
            max_concurrency: max_concurrency.max(1),
        }
    }

    /// Generate indexes for `root` (and its subtree when recursive).
    ///
    /// Folder failures are recorded in the result; the walk always completes.
    #[instrument(skip(self), fields(workers = self.max_concurrency), name = "generate_indexes")]
    pub async fn generate_indexes(&self, root: &Path, options: IndexBatchOptions) -> BatchResult {
        let tracker = RunTracker::new();
        let mut result = BatchResult::new(options.dry_run, &tracker);

        let folders = match self.processor.store().walk_folders(root, options.recursive) {
            Ok(folders) => folders,
            Err(e) => {
                tracing::error!(root = %root.display(), error = %e, "Cannot walk index root");
                result.record(FolderOutcome::from_error(root, &e));
                return result.finish(&tracker);
            }
        };

        tracing::debug!(folders = folders.len(), "Generating indexes");

        let mut outcomes = stream::iter(folders)
            .map(|folder| self.index_folder(folder, &options))
            .buffer_unordered(self.max_concurrency);

        while let Some(outcome) = outcomes.next().await {
            result.record(outcome);
        }

        let result = result.finish(&tracker);
        tracing::info!(
            run_id = %result.run_id,
            processed = result.processed,
            skipped = result.skipped,
            failed = result.failed,
            duration_ms = result.duration_ms,
            "Index generation finished"
        );
        result
    }

    async fn index_folder(&self, folder: PathBuf, options: &IndexBatchOptions) -> FolderOutcome {
        let levels = match self.processor.detect(&folder) {
            Ok(levels) => levels,
            Err(e) => return FolderOutcome::from_error(&folder, &e),
        };

        let template_type = self.processor.template_type_for(&levels);
        if !options.accepts(template_type) {
            return FolderOutcome::Skipped(format!(
                "{}: template type '{}' not selected",
                folder.display(),
                template_type
            ));
        }

        match self
            .processor
            .generate_for_folder(&folder, options.index_options())
            .await
        {
            Ok(outcome) => outcome.into(),
            Err(e) => {
                tracing::warn!(folder = %folder.display(), error = %e, "Index generation failed");
                FolderOutcome::from_error(&folder, &e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use vaultkeeper_schema::SchemaLoader;

    async fn setup() -> (TempDir, VaultIndexBatchProcessor) {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        tokio::fs::create_dir_all(root.join("MBA/Finance/Week 1")).await.unwrap();
        tokio::fs::create_dir_all(root.join("MBA/Marketing")).await.unwrap();
        tokio::fs::create_dir_all(root.join(".obsidian/plugins")).await.unwrap();
        tokio::fs::write(root.join("MBA/Finance/Lecture.md"), "---\ntemplate-type: video-reference\n---\n")
            .await
            .unwrap();

        let config = AppConfig::builder(root).max_concurrency(2).build().unwrap();
        let schema = SchemaLoader::parse(
            "reserved_tags: []\ntemplate_types:\n  video-reference: [title]\n",
            Path::new("schema.yaml"),
        )
        .unwrap();
        (temp, VaultIndexBatchProcessor::new(Arc::new(schema), &config))
    }

    #[tokio::test]
    async fn test_recursive_generation() {
        let (temp, batch) = setup().await;
        let result = batch
            .generate_indexes(
                temp.path(),
                IndexBatchOptions {
                    recursive: true,
                    ..Default::default()
                },
            )
            .await;

        // root, MBA, Finance, Week 1, Marketing
        assert_eq!(result.total_folders, 5);
        assert_eq!(result.processed, 5);
        assert!(result.success);
        assert!(temp.path().join("MBA/Finance/Finance.md").exists());
        assert!(temp.path().join("MBA/Finance/Week 1/Week 1.md").exists());
        assert!(!temp.path().join(".obsidian/.obsidian.md").exists());

        let again = batch
            .generate_indexes(
                temp.path(),
                IndexBatchOptions {
                    recursive: true,
                    ..Default::default()
                },
            )
            .await;
        assert_eq!(again.skipped, 5);
        assert!(again.outputs.is_empty());
    }

    #[tokio::test]
    async fn test_non_recursive_processes_root_only() {
        let (temp, batch) = setup().await;
        let result = batch
            .generate_indexes(Path::new("MBA"), IndexBatchOptions::default())
            .await;
        assert_eq!(result.total_folders, 1);
        assert_eq!(result.outputs, vec![temp.path().join("MBA/MBA.md")]);
    }

    #[tokio::test]
    async fn test_template_type_filter() {
        let (temp, batch) = setup().await;
        let result = batch
            .generate_indexes(
                temp.path(),
                IndexBatchOptions {
                    recursive: true,
                    template_types: Some(vec!["course-index".into()]),
                    ..Default::default()
                },
            )
            .await;

        assert_eq!(result.processed, 2);
        assert_eq!(result.skipped, 3);
        assert!(temp.path().join("MBA/Marketing/Marketing.md").exists());
        assert!(!temp.path().join("MBA/MBA.md").exists());
    }

    #[tokio::test]
    async fn test_dry_run_is_pure() {
        let (temp, batch) = setup().await;
        let result = batch
            .generate_indexes(
                temp.path(),
                IndexBatchOptions {
                    dry_run: true,
                    recursive: true,
                    ..Default::default()
                },
            )
            .await;

        assert!(result.dry_run);
        assert_eq!(result.outputs.len(), 5);
        for output in &result.outputs {
            assert!(!output.exists());
        }
    }

    #[tokio::test]
    async fn test_failing_folder_does_not_abort_walk() {
        let (temp, batch) = setup().await;
        // A directory squatting on the index name cannot be read or replaced
        tokio::fs::create_dir(temp.path().join("MBA/Marketing/Marketing.md"))
            .await
            .unwrap();

        let result = batch
            .generate_indexes(
                temp.path(),
                IndexBatchOptions {
                    recursive: true,
                    force_overwrite: true,
                    ..Default::default()
                },
            )
            .await;

        assert_eq!(result.total_folders, 6);
        assert_eq!(result.failed, 1);
        assert_eq!(result.processed, 5);
        assert!(!result.success);
        assert_eq!(result.exit_code(), 1);
        assert!(result.errors[0].contains("Marketing"));
    }

    #[tokio::test]
    async fn test_root_outside_vault_is_skipped() {
        let (_temp, batch) = setup().await;
        let outside = TempDir::new().unwrap();
        let result = batch
            .generate_indexes(outside.path(), IndexBatchOptions::default())
            .await;
        assert_eq!((result.skipped, result.failed), (1, 0));
        assert!(result.success);
        assert!(!outside.path().join(format!("{}.md", outside.path().file_name().unwrap().to_string_lossy())).exists());
    }

    #[tokio::test]
    async fn test_missing_root_is_reported() {
        let (_temp, batch) = setup().await;
        let result = batch
            .generate_indexes(Path::new("Nope"), IndexBatchOptions::default())
            .await;
        assert_eq!(result.failed, 1);
        assert!(!result.success);
    }
}
