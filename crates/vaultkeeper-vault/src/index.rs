//! Folder index generation.
//!
//! Every folder gets an index note named after itself
//! (`MBA/Finance/Finance.md`) linking its subfolders and notes. The index
//! template type follows the folder's hierarchy level through the schema's
//! type mapping.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::instrument;
use vaultkeeper_core::prelude::*;
use vaultkeeper_core::{AUTO_GENERATED_STATE_KEY, TEMPLATE_TYPE_KEY};
use vaultkeeper_schema::Schema;

use crate::notes::{FolderInventory, NOTE_EXTENSION, NoteEntry, NoteStore};

/// `auto-generated-state` value that protects a file from regeneration
pub const READ_ONLY_STATE: &str = "read-only";
/// `auto-generated-state` value of freshly generated files
pub const WRITABLE_STATE: &str = "writable";

/// Per-call switches for index generation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndexOptions {
    pub dry_run: bool,
    /// Replace an existing generated index unless it is read-only
    pub force_overwrite: bool,
}

/// What happened to one folder's index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndexOutcome {
    Written(PathBuf),
    WouldWrite(PathBuf),
    Skipped { path: PathBuf, reason: String },
}

impl IndexOutcome {
    /// Index file the outcome refers to
    pub fn path(&self) -> &Path {
        match self {
            Self::Written(p) | Self::WouldWrite(p) => p,
            Self::Skipped { path, .. } => path,
        }
    }
}

impl From<IndexOutcome> for FolderOutcome {
    fn from(outcome: IndexOutcome) -> Self {
        match outcome {
            IndexOutcome::Written(p) | IndexOutcome::WouldWrite(p) => FolderOutcome::Processed(Some(p)),
            IndexOutcome::Skipped { path, reason } => {
                FolderOutcome::Skipped(format!("{}: {}", path.display(), reason))
            }
        }
    }
}

/// Section a note is listed under
fn section_for(template_type: Option<&str>) -> &'static str {
    match template_type {
        Some(t) if t.contains("video") => "Videos",
        Some(t) if ["reading", "pdf", "article", "book", "paper"].iter().any(|k| t.contains(k)) => {
            "Readings"
        }
        Some(t) if t.contains("transcript") => "Transcripts",
        _ => "Notes",
    }
}

const SECTION_ORDER: &[&str] = &["Videos", "Readings", "Transcripts", "Notes"];

/// Generates the index note of a single folder
pub struct VaultIndexProcessor {
    schema: Arc<Schema>,
    store: NoteStore,
    detector: MetadataHierarchyDetector,
    level_names: Vec<String>,
    today: NaiveDate,
}

impl VaultIndexProcessor {
    pub fn new(schema: Arc<Schema>, config: &AppConfig) -> Self {
        Self {
            schema,
            store: NoteStore::from_config(config),
            detector: MetadataHierarchyDetector::from_config(config),
            level_names: config.level_names.clone(),
            today: chrono::Local::now().date_naive(),
        }
    }

    /// Pin the date written to `date-created`/`date-modified`
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    pub fn store(&self) -> &NoteStore {
        &self.store
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Hierarchy levels of a folder
    pub fn detect(&self, folder: &Path) -> Result<HierarchyLevels> {
        self.detector.detect_folder(folder)
    }

    /// Index template type for a folder's levels
    pub fn template_type_for<'a>(&'a self, levels: &HierarchyLevels) -> &'a str {
        self.schema.template_type_for_level(levels.level_name())
    }

    /// Path of a folder's index note
    pub fn index_path(&self, folder: &Path) -> Result<PathBuf> {
        let full = self.store.resolve(folder)?;
        Ok(full.join(format!("{}.{}", folder_title(&full), NOTE_EXTENSION)))
    }

    /// Detect levels, take the inventory and generate in one step
    pub async fn generate_for_folder(&self, folder: &Path, options: IndexOptions) -> Result<IndexOutcome> {
        let levels = self.detect(folder)?;
        let inventory = self.store.folder_inventory(folder).await?;
        self.generate_index(folder, &levels, &inventory, options).await
    }

    /// Write (or plan) the index of one folder
    #[instrument(skip(self, levels, inventory), fields(dry_run = options.dry_run, force = options.force_overwrite), name = "generate_index")]
    pub async fn generate_index(
        &self,
        folder: &Path,
        levels: &HierarchyLevels,
        inventory: &FolderInventory,
        options: IndexOptions,
    ) -> Result<IndexOutcome> {
        let path = self.index_path(folder)?;

        let existing = if tokio::fs::try_exists(&path).await.map_err(Error::io)? {
            match self.store.read_note(&path).await {
                Ok(note) => Some(note.frontmatter_or_default()),
                Err(e) if options.force_overwrite => {
                    tracing::warn!(file = %path.display(), error = %e, "Not replacing unreadable index");
                    return Err(e);
                }
                Err(e) => {
                    tracing::debug!(file = %path.display(), error = %e, "Existing index is unreadable");
                    return Ok(IndexOutcome::Skipped {
                        path,
                        reason: "index exists".to_string(),
                    });
                }
            }
        } else {
            None
        };

        if let Some(fm) = &existing {
            let state = fm.get_text(AUTO_GENERATED_STATE_KEY);
            if state == Some(READ_ONLY_STATE) {
                tracing::debug!(file = %path.display(), "Index is read-only");
                return Ok(IndexOutcome::Skipped {
                    path,
                    reason: "index is read-only".to_string(),
                });
            }
            if !options.force_overwrite {
                return Ok(IndexOutcome::Skipped {
                    path,
                    reason: "index exists".to_string(),
                });
            }
            if state.is_none() {
                tracing::warn!(file = %path.display(), "Not replacing index without {}", AUTO_GENERATED_STATE_KEY);
                return Ok(IndexOutcome::Skipped {
                    path,
                    reason: "index was not generated".to_string(),
                });
            }
        }

        let full = self.store.resolve(folder)?;
        let title = folder_title(&full);
        let frontmatter = self.frontmatter(existing.unwrap_or_default(), &title, levels);
        let body = self.body(&title, levels, inventory);

        if options.dry_run {
            return Ok(IndexOutcome::WouldWrite(path));
        }

        self.store.write_note(&path, &frontmatter, &body).await?;
        tracing::info!(file = %path.display(), "Generated index");
        Ok(IndexOutcome::Written(path))
    }

    fn frontmatter(&self, mut fm: FrontmatterMap, title: &str, levels: &HierarchyLevels) -> FrontmatterMap {
        let today = self.today.format("%Y-%m-%d").to_string();
        fm.insert(TEMPLATE_TYPE_KEY, self.template_type_for(levels));
        fm.insert("title", title);
        fm.insert(AUTO_GENERATED_STATE_KEY, WRITABLE_STATE);
        for level in levels.iter().filter(|l| self.level_names.contains(&l.name)) {
            fm.insert(level.name.clone(), level.value.clone());
        }
        if !fm.has_value("date-created") {
            fm.insert("date-created", today.clone());
        }
        fm.insert("date-modified", today);
        fm
    }

    fn body(&self, title: &str, levels: &HierarchyLevels, inventory: &FolderInventory) -> String {
        let mut out = format!("\n# {}\n", title);

        if !levels.is_root() {
            let parent = inventory
                .folder
                .parent()
                .map(folder_title)
                .unwrap_or_default();
            if !parent.is_empty() {
                let _ = write!(out, "\nUp: [[{}]]\n", parent);
            }
        }

        if !inventory.subfolders.is_empty() {
            out.push_str("\n## Folders\n\n");
            for sub in &inventory.subfolders {
                let _ = writeln!(out, "- [[{}]]", sub);
            }
        }

        let listed: Vec<&NoteEntry> = inventory
            .notes
            .iter()
            .filter(|n| n.name != title)
            .filter(|n| !n.template_type.as_deref().is_some_and(|t| self.schema.is_index_type(t)))
            .collect();

        for section in SECTION_ORDER {
            let notes: Vec<_> = listed
                .iter()
                .filter(|n| section_for(n.template_type.as_deref()) == *section)
                .collect();
            if notes.is_empty() {
                continue;
            }
            let _ = write!(out, "\n## {}\n\n", section);
            for note in notes {
                let _ = writeln!(out, "- [[{}]]", note.name);
            }
        }

        out
    }
}

/// Display name of a folder, falling back to `index` for a bare root
fn folder_title(folder: &Path) -> String {
    folder
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "index".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use vaultkeeper_schema::SchemaLoader;

    const SCHEMA: &str = "reserved_tags: [video]\ntemplate_types:\n  video-reference: [title]\n  pdf-reference: [title]\n";

    async fn setup() -> (TempDir, VaultIndexProcessor) {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        let finance = root.join("MBA/Finance");
        tokio::fs::create_dir_all(finance.join("Week 1")).await.unwrap();
        tokio::fs::write(finance.join("Lecture 1.md"), "---\ntemplate-type: video-reference\n---\n")
            .await
            .unwrap();
        tokio::fs::write(finance.join("Case.md"), "---\ntemplate-type: pdf-reference\n---\n")
            .await
            .unwrap();
        tokio::fs::write(finance.join("scratch.md"), "plain\n").await.unwrap();
        tokio::fs::write(finance.join("Old.md"), "---\ntemplate-type: class-index\n---\n")
            .await
            .unwrap();

        let config = AppConfig::builder(root).build().unwrap();
        let schema = SchemaLoader::parse(SCHEMA, Path::new("schema.yaml")).unwrap();
        let processor = VaultIndexProcessor::new(Arc::new(schema), &config)
            .with_today(NaiveDate::from_ymd_opt(2026, 3, 14).unwrap());
        (temp, processor)
    }

    fn write_opts() -> IndexOptions {
        IndexOptions::default()
    }

    #[tokio::test]
    async fn test_generates_grouped_index() {
        let (temp, processor) = setup().await;
        let outcome = processor
            .generate_for_folder(Path::new("MBA/Finance"), write_opts())
            .await
            .unwrap();

        let index = temp.path().join("MBA/Finance/Finance.md");
        assert_eq!(outcome, IndexOutcome::Written(index.clone()));

        let note = processor.store().read_note(&index).await.unwrap();
        let fm = note.frontmatter.unwrap();
        assert_eq!(fm.template_type(), Some("course-index"));
        assert_eq!(fm.get_text("program"), Some("MBA"));
        assert_eq!(fm.get_text("course"), Some("Finance"));
        assert_eq!(fm.get_text("auto-generated-state"), Some("writable"));
        assert_eq!(fm.get_text("date-created"), Some("2026-03-14"));

        let body = note.body;
        assert!(body.contains("# Finance"));
        assert!(body.contains("Up: [[MBA]]"));
        assert!(body.contains("## Folders\n\n- [[Week 1]]"));
        assert!(body.contains("## Videos\n\n- [[Lecture 1]]"));
        assert!(body.contains("## Readings\n\n- [[Case]]"));
        assert!(body.contains("## Notes\n\n- [[scratch]]"));
        assert!(!body.contains("[[Old]]"));
        assert!(!body.contains("[[Finance]]"));
    }

    #[tokio::test]
    async fn test_existing_index_needs_force() {
        let (_temp, processor) = setup().await;
        let folder = Path::new("MBA/Finance");
        processor.generate_for_folder(folder, write_opts()).await.unwrap();

        let again = processor.generate_for_folder(folder, write_opts()).await.unwrap();
        assert!(matches!(again, IndexOutcome::Skipped { .. }));

        let forced = processor
            .generate_for_folder(
                folder,
                IndexOptions {
                    force_overwrite: true,
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(matches!(forced, IndexOutcome::Written(_)));
    }

    #[tokio::test]
    async fn test_read_only_index_is_never_replaced() {
        let (temp, processor) = setup().await;
        let index = temp.path().join("MBA/MBA.md");
        let original = "---\nauto-generated-state: read-only\n---\nHand written\n";
        tokio::fs::write(&index, original).await.unwrap();

        let outcome = processor
            .generate_for_folder(
                Path::new("MBA"),
                IndexOptions {
                    force_overwrite: true,
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert!(matches!(outcome, IndexOutcome::Skipped { .. }));
        assert_eq!(tokio::fs::read_to_string(&index).await.unwrap(), original);
    }

    #[tokio::test]
    async fn test_force_keeps_created_date_and_custom_keys() {
        let (temp, processor) = setup().await;
        let index = temp.path().join("MBA/MBA.md");
        tokio::fs::write(
            &index,
            "---\nauto-generated-state: writable\ndate-created: '2020-01-01'\nowner: me\n---\nOld body\n",
        )
            .await
            .unwrap();

        processor
            .generate_for_folder(
                Path::new("MBA"),
                IndexOptions {
                    force_overwrite: true,
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let note = processor.store().read_note(&index).await.unwrap();
        let fm = note.frontmatter.unwrap();
        assert_eq!(fm.get_text("date-created"), Some("2020-01-01"));
        assert_eq!(fm.get_text("owner"), Some("me"));
        assert_eq!(fm.template_type(), Some("program-index"));
        assert!(!note.body.contains("Old body"));
    }

    #[tokio::test]
    async fn test_hand_written_index_survives_force() {
        let (temp, processor) = setup().await;
        let index = temp.path().join("MBA/MBA.md");
        let original = "---\ntitle: My own overview\n---\nHand written\n";
        tokio::fs::write(&index, original).await.unwrap();

        let outcome = processor
            .generate_for_folder(
                Path::new("MBA"),
                IndexOptions {
                    force_overwrite: true,
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert!(matches!(outcome, IndexOutcome::Skipped { ref reason, .. } if reason == "index was not generated"));
        assert_eq!(tokio::fs::read_to_string(&index).await.unwrap(), original);
    }

    #[tokio::test]
    async fn test_unreadable_index_is_not_replaced() {
        let (temp, processor) = setup().await;
        let index = temp.path().join("MBA/MBA.md");
        tokio::fs::create_dir(&index).await.unwrap();

        let plain = processor
            .generate_for_folder(Path::new("MBA"), IndexOptions::default())
            .await
            .unwrap();
        assert!(matches!(plain, IndexOutcome::Skipped { .. }));

        let forced = processor
            .generate_for_folder(
                Path::new("MBA"),
                IndexOptions {
                    force_overwrite: true,
                    ..Default::default()
                },
            )
            .await;
        assert!(forced.is_err());
        assert!(index.is_dir());
    }

    #[tokio::test]
    async fn test_dry_run_writes_nothing() {
        let (temp, processor) = setup().await;
        let outcome = processor
            .generate_for_folder(
                Path::new("MBA"),
                IndexOptions {
                    dry_run: true,
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let index = temp.path().join("MBA/MBA.md");
        assert_eq!(outcome, IndexOutcome::WouldWrite(index.clone()));
        assert!(!index.exists());
    }

    #[test]
    fn test_sections() {
        assert_eq!(section_for(Some("video-reference")), "Videos");
        assert_eq!(section_for(Some("pdf-reference")), "Readings");
        assert_eq!(section_for(Some("lecture-transcript")), "Transcripts");
        assert_eq!(section_for(None), "Notes");
    }
}
