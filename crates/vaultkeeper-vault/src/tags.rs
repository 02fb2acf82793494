//! Tag and metadata enforcement for single notes.
//!
//! [`TagProcessor`] fills missing universal/required fields through the
//! resolver registry, normalizes and filters tags against the schema, and
//! flags unknown keys. The two modes differ only in that a dry run keeps
//! rejected tags in the computed header and never writes it back.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::instrument;
use vaultkeeper_core::prelude::*;
use vaultkeeper_core::TAGS_KEY;
use vaultkeeper_schema::{FieldResolverRegistry, ResolveContext, Schema, normalize_tag};

use crate::notes::NoteStore;

/// Whether results are persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProcessingMode {
    /// Compute and report only
    DryRun,
    /// Compute and write changed notes
    Apply,
}

impl ProcessingMode {
    pub fn from_dry_run(dry_run: bool) -> Self {
        if dry_run { Self::DryRun } else { Self::Apply }
    }

    pub fn is_dry_run(&self) -> bool {
        matches!(self, Self::DryRun)
    }
}

/// What processing did (or would do) to one note
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NoteOutcome {
    /// Vault-relative note path
    pub path: PathBuf,
    /// Template type the note was processed as
    pub template_type: Option<String>,
    /// Normalized tags introduced in place of other spellings
    pub added: Vec<String>,
    /// Original tag spellings dropped (renamed, duplicate, blank, or
    /// rejected in apply mode)
    pub removed: Vec<String>,
    /// Normalized tags that the schema does not accept
    pub rejected: Vec<String>,
    /// Fields filled in by resolvers
    pub added_fields: Vec<String>,
    pub warnings: Vec<SchemaWarning>,
    /// Frontmatter differs from what is on disk
    pub changed: bool,
    /// Changes were written
    pub written: bool,
}

impl NoteOutcome {
    fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            ..Default::default()
        }
    }
}

/// Running counts across the notes of one batch
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TagStats {
    pub notes_scanned: usize,
    pub notes_modified: usize,
    pub tags_added: usize,
    pub tags_removed: usize,
    pub tags_rejected: usize,
    pub fields_added: usize,
    pub warnings: usize,
    pub warnings_by_kind: BTreeMap<WarningKind, usize>,
}

impl TagStats {
    /// Fold one note's outcome in
    pub fn record(&mut self, outcome: &NoteOutcome) {
        self.notes_scanned += 1;
        if outcome.changed {
            self.notes_modified += 1;
        }
        self.tags_added += outcome.added.len();
        self.tags_removed += outcome.removed.len();
        self.tags_rejected += outcome.rejected.len();
        self.fields_added += outcome.added_fields.len();
        self.warnings += outcome.warnings.len();
        for warning in &outcome.warnings {
            *self.warnings_by_kind.entry(warning.kind).or_default() += 1;
        }
    }

    /// Combine with another batch's counts
    pub fn merge(&mut self, other: &TagStats) {
        self.notes_scanned += other.notes_scanned;
        self.notes_modified += other.notes_modified;
        self.tags_added += other.tags_added;
        self.tags_removed += other.tags_removed;
        self.tags_rejected += other.tags_rejected;
        self.fields_added += other.fields_added;
        self.warnings += other.warnings;
        for (kind, count) in &other.warnings_by_kind {
            *self.warnings_by_kind.entry(*kind).or_default() += count;
        }
    }
}

/// Validates and normalizes note frontmatter against the schema.
///
/// One processor serves one batch; its [`TagStats`] accumulate across calls
/// and are handed back with [`TagProcessor::into_stats`].
pub struct TagProcessor {
    schema: Arc<Schema>,
    registry: Arc<FieldResolverRegistry>,
    detector: MetadataHierarchyDetector,
    store: NoteStore,
    mode: ProcessingMode,
    allow_unknown_tags: bool,
    today: NaiveDate,
    stats: TagStats,
}

impl TagProcessor {
    /// Create a processor for one batch
    pub fn new(
        schema: Arc<Schema>,
        registry: Arc<FieldResolverRegistry>,
        config: &AppConfig,
        mode: ProcessingMode,
    ) -> Self {
        Self {
            schema,
            registry,
            detector: MetadataHierarchyDetector::from_config(config),
            store: NoteStore::from_config(config),
            mode,
            allow_unknown_tags: config.allow_unknown_tags,
            today: chrono::Local::now().date_naive(),
            stats: TagStats::default(),
        }
    }

    /// Pin the date used by date resolvers
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    pub fn mode(&self) -> ProcessingMode {
        self.mode
    }

    /// Counts so far
    pub fn stats(&self) -> &TagStats {
        &self.stats
    }

    /// Finish the batch and take the counts
    pub fn into_stats(self) -> TagStats {
        self.stats
    }

    /// Process frontmatter already in memory. Never writes.
    pub fn process(
        &mut self,
        note_path: &Path,
        frontmatter: FrontmatterMap,
        levels: &HierarchyLevels,
    ) -> (FrontmatterMap, NoteOutcome) {
        let original = frontmatter.clone();
        let mut fm = frontmatter;
        let mut outcome = NoteOutcome::new(note_path);

        let tags = self.normalize_tags(&mut fm, &mut outcome);
        let template_type = self.template_type(&fm, &tags, &mut outcome);
        self.fill_fields(&mut fm, levels, template_type.as_deref(), &mut outcome);
        self.flag_unknown_keys(&fm, template_type.as_deref(), &mut outcome);

        outcome.template_type = template_type;
        outcome.changed = fm != original;
        self.stats.record(&outcome);
        (fm, outcome)
    }

    /// Read a note, process it, and in apply mode write it back if changed
    #[instrument(skip(self), fields(mode = ?self.mode), name = "process_note")]
    pub async fn process_note(&mut self, path: &Path) -> Result<NoteOutcome> {
        let rel = self.store.relative(path)?;
        let raw = self.store.read_raw(&rel).await?;

        let note = match vaultkeeper_parser::split(&raw) {
            Ok(note) => note,
            Err(e) => {
                let mut outcome = NoteOutcome::new(&rel);
                outcome.warnings.push(SchemaWarning::new(
                    WarningKind::MalformedFrontmatter,
                    &rel,
                    e.to_string(),
                ));
                tracing::warn!(note = %rel.display(), error = %e, "Leaving note with malformed frontmatter untouched");
                self.stats.record(&outcome);
                return Ok(outcome);
            }
        };

        let levels = self.detector.detect_note(&rel)?;
        let (updated, mut outcome) = self.process(&rel, note.frontmatter_or_default(), &levels);

        if outcome.changed && self.mode == ProcessingMode::Apply {
            self.store.write_note(&rel, &updated, &note.body).await?;
            outcome.written = true;
        }

        tracing::debug!(
            note = %rel.display(),
            changed = outcome.changed,
            rejected = outcome.rejected.len(),
            fields = outcome.added_fields.len(),
            "Processed note"
        );
        Ok(outcome)
    }

    fn normalize_tags(&self, fm: &mut FrontmatterMap, outcome: &mut NoteOutcome) -> Vec<String> {
        if !fm.contains_key(TAGS_KEY) {
            return Vec::new();
        }

        let Some(raw_tags) = fm.try_tags() else {
            outcome.warnings.push(
                SchemaWarning::new(
                    WarningKind::MalformedTags,
                    &outcome.path,
                    "tags hold nested values and were left untouched",
                )
                .with_field(TAGS_KEY),
            );
            return Vec::new();
        };

        let mut seen = BTreeSet::new();
        let mut kept = Vec::new();

        for raw in raw_tags {
            let Some(tag) = normalize_tag(&raw) else {
                outcome.removed.push(raw);
                continue;
            };
            if !seen.insert(tag.clone()) {
                outcome.removed.push(raw);
                continue;
            }
            if !self.accepts(&tag) {
                outcome.rejected.push(tag.clone());
                if self.mode == ProcessingMode::Apply {
                    outcome.removed.push(raw);
                    continue;
                }
            }
            if tag != raw {
                outcome.removed.push(raw);
                outcome.added.push(tag.clone());
            }
            kept.push(tag);
        }

        let untouched = kept.is_empty() && outcome.removed.is_empty();
        if !untouched && fm.get(TAGS_KEY) != Some(&FieldValue::List(kept.clone())) {
            fm.set_tags(kept.clone());
        }
        kept
    }

    fn accepts(&self, tag: &str) -> bool {
        self.schema.is_reserved(tag) || self.schema.matches_prefix(tag) || self.allow_unknown_tags
    }

    /// Declared template type, else one mapped from the note's tags
    fn template_type(&self, fm: &FrontmatterMap, tags: &[String], outcome: &mut NoteOutcome) -> Option<String> {
        if let Some(declared) = fm.template_type() {
            if !self.schema.has_template_type(declared) && !self.schema.is_index_type(declared) {
                outcome.warnings.push(
                    SchemaWarning::new(
                        WarningKind::UnknownTemplateType,
                        &outcome.path,
                        format!("template type '{}' is not defined by the schema", declared),
                    )
                    .with_field(vaultkeeper_core::TEMPLATE_TYPE_KEY),
                );
            }
            return Some(declared.to_string());
        }

        tags.iter()
            .filter_map(|t| self.schema.type_mapping.get(t))
            .find(|t| self.schema.has_template_type(t))
            .cloned()
    }

    fn fill_fields(
        &self,
        fm: &mut FrontmatterMap,
        levels: &HierarchyLevels,
        template_type: Option<&str>,
        outcome: &mut NoteOutcome,
    ) {
        let mut wanted: Vec<&str> = self.schema.universal_fields.iter().map(String::as_str).collect();
        if let Some(fields) = template_type.and_then(|t| self.schema.fields_for(t)) {
            for spec in fields.iter().filter(|f| f.required) {
                if !wanted.contains(&spec.name.as_str()) {
                    wanted.push(&spec.name);
                }
            }
        }

        for field in wanted {
            if fm.has_value(field) {
                continue;
            }
            let resolved = {
                let ctx = ResolveContext {
                    note_path: &outcome.path,
                    frontmatter: fm,
                    levels,
                    template_type,
                    today: self.today,
                };
                self.registry.resolve(field, &ctx)
            };
            match resolved {
                Some(value) => {
                    fm.insert(field, value);
                    outcome.added_fields.push(field.to_string());
                }
                None => outcome.warnings.push(
                    SchemaWarning::new(
                        WarningKind::MissingRequired,
                        &outcome.path,
                        format!("no value could be resolved for '{}'", field),
                    )
                    .with_field(field),
                ),
            }
        }
    }

    fn flag_unknown_keys(&self, fm: &FrontmatterMap, template_type: Option<&str>, outcome: &mut NoteOutcome) {
        let Some(template_type) = template_type.filter(|t| self.schema.has_template_type(t)) else {
            return;
        };
        let known = self.schema.known_fields(Some(template_type));
        for key in fm.keys().filter(|k| !known.contains(k)) {
            outcome.warnings.push(
                SchemaWarning::new(
                    WarningKind::UnknownField,
                    &outcome.path,
                    format!("'{}' is not a field of '{}'", key, template_type),
                )
                .with_field(key),
            );
        }
    }
}
