//! Core data models: frontmatter maps and batch/sync result records.

use crate::error::{Error, Result};
use crate::utils::RunTracker;
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};
use std::path::{Path, PathBuf};

/// Frontmatter key holding the note's tags
pub const TAGS_KEY: &str = "tags";
/// Frontmatter key naming the note's template type
pub const TEMPLATE_TYPE_KEY: &str = "template-type";
/// Frontmatter key controlling whether generated files may be rewritten
pub const AUTO_GENERATED_STATE_KEY: &str = "auto-generated-state";

/// A single frontmatter value.
///
/// Strings and string lists are typed; anything else (numbers, booleans,
/// nested maps) is carried verbatim so rewriting a note never loses data.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    List(Vec<String>),
    Other(Value),
}

impl FieldValue {
    /// Convert from a YAML value
    pub fn from_yaml(value: Value) -> Self {
        match value {
            Value::String(s) => Self::Text(s),
            Value::Sequence(seq) if seq.iter().all(Value::is_string) => Self::List(
                seq.into_iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect(),
            ),
            other => Self::Other(other),
        }
    }

    /// Convert to a YAML value
    pub fn to_yaml(&self) -> Value {
        match self {
            Self::Text(s) => Value::String(s.clone()),
            Self::List(items) => {
                Value::Sequence(items.iter().cloned().map(Value::String).collect())
            }
            Self::Other(v) => v.clone(),
        }
    }

    /// Text content, if this is a single string
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Empty strings, empty lists and YAML nulls count as missing
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Text(s) => s.trim().is_empty(),
            Self::List(items) => items.is_empty(),
            Self::Other(v) => v.is_null(),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(items: Vec<String>) -> Self {
        Self::List(items)
    }
}

/// Ordered key → value frontmatter header
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrontmatterMap {
    entries: Vec<Entry>,
}

/// One header line. `key` keeps the YAML key as written (`2024:` stays a
/// number) while `name` is its text form used for lookups.
#[derive(Debug, Clone, PartialEq)]
struct Entry {
    name: String,
    key: Value,
    value: FieldValue,
}

impl FrontmatterMap {
    /// Create an empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a parsed YAML mapping, keeping key order
    pub fn from_yaml_mapping(mapping: Mapping) -> Result<Self> {
        let mut map = Self::new();
        for (key, value) in mapping {
            let name = match &key {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                other => {
                    return Err(Error::parse_error(format!(
                        "Unsupported frontmatter key: {:?}",
                        other
                    )));
                }
            };
            let value = FieldValue::from_yaml(value);
            match map.position(&name) {
                Some(idx) => map.entries[idx].value = value,
                None => map.entries.push(Entry { name, key, value }),
            }
        }
        Ok(map)
    }

    /// Convert back to a YAML mapping in key order
    pub fn to_yaml_mapping(&self) -> Mapping {
        self.entries
            .iter()
            .map(|e| (e.key.clone(), e.value.to_yaml()))
            .collect()
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.name == key)
    }

    /// Look up a key
    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.position(key).map(|idx| &self.entries[idx].value)
    }

    /// Text value of a key
    pub fn get_text(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(FieldValue::as_text)
    }

    /// Whether the key is present with a non-blank value
    pub fn has_value(&self, key: &str) -> bool {
        self.get(key).is_some_and(|v| !v.is_blank())
    }

    /// Whether the key is present at all
    pub fn contains_key(&self, key: &str) -> bool {
        self.position(key).is_some()
    }

    /// Set a key, replacing in place or appending at the end
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<FieldValue>) {
        let name = key.into();
        let value = value.into();
        match self.position(&name) {
            Some(idx) => self.entries[idx].value = value,
            None => self.entries.push(Entry {
                key: Value::String(name.clone()),
                name,
                value,
            }),
        }
    }

    /// Remove a key, returning its value
    pub fn remove(&mut self, key: &str) -> Option<FieldValue> {
        let idx = self.position(key)?;
        Some(self.entries.remove(idx).value)
    }

    /// Keys in order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.name.as_str())
    }

    /// Entries in order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.entries.iter().map(|e| (e.name.as_str(), &e.value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Raw tags as written, in order, or empty when they cannot be read.
    pub fn tags(&self) -> Vec<String> {
        self.try_tags().unwrap_or_default()
    }

    /// Raw tags as written, in order.
    ///
    /// A scalar `tags` value is split on commas and whitespace. Number and
    /// boolean items read as their text form, nulls as empty strings.
    /// Returns `None` when the value holds a nested map or list.
    pub fn try_tags(&self) -> Option<Vec<String>> {
        match self.get(TAGS_KEY) {
            None => Some(Vec::new()),
            Some(FieldValue::Text(s)) => Some(split_tags(s)),
            Some(FieldValue::List(items)) => Some(items.clone()),
            Some(FieldValue::Other(Value::Sequence(items))) => {
                items.iter().map(scalar_text).collect()
            }
            Some(FieldValue::Other(value)) => scalar_text(value).map(|s| split_tags(&s)),
        }
    }

    /// Replace the tag list, keeping the key's position
    pub fn set_tags(&mut self, tags: Vec<String>) {
        self.insert(TAGS_KEY, FieldValue::List(tags));
    }

    /// The note's declared template type
    pub fn template_type(&self) -> Option<&str> {
        self.get_text(TEMPLATE_TYPE_KEY)
    }
}

fn split_tags(s: &str) -> Vec<String> {
    s.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null => Some(String::new()),
        _ => None,
    }
}

/// Per-folder outcome folded into a [`BatchResult`]
#[derive(Debug, Clone, PartialEq)]
pub enum FolderOutcome {
    /// Folder handled; carries the file written or removed, if any
    Processed(Option<PathBuf>),
    /// Folder intentionally left alone
    Skipped(String),
    /// Folder failed; the walk continues
    Failed(String),
}

impl FolderOutcome {
    /// Classify a per-folder error: paths outside the root are skipped,
    /// anything else fails the folder.
    pub fn from_error(path: &Path, error: &Error) -> Self {
        match error {
            Error::PathOutsideRoot { .. } => {
                tracing::warn!(path = %path.display(), error = %error, "Skipping path outside root");
                Self::Skipped(error.to_string())
            }
            _ => Self::Failed(format!("{}: {}", path.display(), error)),
        }
    }
}

/// Result of a folder batch (index generation, index cleanup, metadata)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResult {
    /// Whether no folder failed
    pub success: bool,
    /// Whether this was a dry run
    pub dry_run: bool,
    /// Folders (or notes) visited
    pub total_folders: usize,
    pub processed: usize,
    pub skipped: usize,
    pub failed: usize,
    /// Files written or removed (or that would be, in a dry run)
    pub outputs: Vec<PathBuf>,
    /// Per-item error messages
    pub errors: Vec<String>,
    /// Unique run ID
    pub run_id: String,
    /// Execution duration in milliseconds
    pub duration_ms: u64,
}

impl BatchResult {
    /// Empty result for a run
    pub fn new(dry_run: bool, tracker: &RunTracker) -> Self {
        Self {
            success: true,
            dry_run,
            total_folders: 0,
            processed: 0,
            skipped: 0,
            failed: 0,
            outputs: Vec::new(),
            errors: Vec::new(),
            run_id: tracker.run_id().to_string(),
            duration_ms: 0,
        }
    }

    /// Fold one outcome into the totals
    pub fn record(&mut self, outcome: FolderOutcome) {
        self.total_folders += 1;
        match outcome {
            FolderOutcome::Processed(output) => {
                self.processed += 1;
                self.outputs.extend(output);
            }
            FolderOutcome::Skipped(_) => self.skipped += 1,
            FolderOutcome::Failed(message) => {
                self.failed += 1;
                self.errors.push(message);
            }
        }
    }

    /// Seal the result
    pub fn finish(mut self, tracker: &RunTracker) -> Self {
        self.success = self.failed == 0;
        self.outputs.sort();
        self.duration_ms = tracker.elapsed_ms();
        self
    }

    /// Process exit code for this result
    pub fn exit_code(&self) -> i32 {
        if self.failed > 0 { 1 } else { 0 }
    }
}

/// Per-directory outcome folded into a [`SyncResult`]
#[derive(Debug, Clone, PartialEq)]
pub enum SyncOutcome {
    /// Present on both sides
    Synchronized,
    /// Created (or would be) in the source tree
    CreatedInSource(PathBuf),
    /// Created (or would be) in the vault
    CreatedInVault(PathBuf),
    /// Vault-only directory left alone by a unidirectional sync
    Skipped(PathBuf),
    /// Creation failed
    Failed(PathBuf, String),
}

/// Result of a directory synchronization run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncResult {
    /// Whether no directory failed
    pub success: bool,
    /// Whether this was a dry run
    pub dry_run: bool,
    /// Directories seen on either side
    pub total_folders: usize,
    pub synchronized: usize,
    pub skipped: usize,
    pub failed: usize,
    pub created_in_source: usize,
    pub created_in_vault: usize,
    /// Absolute paths created (or that would be, in a dry run)
    pub created: Vec<PathBuf>,
    /// Per-directory error messages
    pub errors: Vec<String>,
    /// Unique run ID
    pub run_id: String,
    /// Execution duration in milliseconds
    pub duration_ms: u64,
}

impl SyncResult {
    /// Empty result for a run
    pub fn new(dry_run: bool, tracker: &RunTracker) -> Self {
        Self {
            success: true,
            dry_run,
            total_folders: 0,
            synchronized: 0,
            skipped: 0,
            failed: 0,
            created_in_source: 0,
            created_in_vault: 0,
            created: Vec::new(),
            errors: Vec::new(),
            run_id: tracker.run_id().to_string(),
            duration_ms: 0,
        }
    }

    /// Fold one outcome into the totals
    pub fn record(&mut self, outcome: SyncOutcome) {
        self.total_folders += 1;
        match outcome {
            SyncOutcome::Synchronized => self.synchronized += 1,
            SyncOutcome::CreatedInSource(path) => {
                self.created_in_source += 1;
                self.created.push(path);
            }
            SyncOutcome::CreatedInVault(path) => {
                self.created_in_vault += 1;
                self.created.push(path);
            }
            SyncOutcome::Skipped(_) => self.skipped += 1,
            SyncOutcome::Failed(path, message) => {
                self.failed += 1;
                self.errors.push(format!("{}: {}", path.display(), message));
            }
        }
    }

    /// Seal the result
    pub fn finish(mut self, tracker: &RunTracker) -> Self {
        self.success = self.failed == 0;
        self.created.sort();
        self.errors.sort();
        self.duration_ms = tracker.elapsed_ms();
        self
    }

    /// Process exit code for this result
    pub fn exit_code(&self) -> i32 {
        if self.failed > 0 { 1 } else { 0 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(yaml: &str) -> FrontmatterMap {
        let mapping: Mapping = serde_yaml::from_str(yaml).unwrap();
        FrontmatterMap::from_yaml_mapping(mapping).unwrap()
    }

    #[test]
    fn test_frontmatter_keeps_order_and_types() {
        let fm = parse("title: Intro\nyear: 2024\ntags:\n  - video\n  - Finance\nextra:\n  nested: true\n");
        let keys: Vec<_> = fm.keys().collect();
        assert_eq!(keys, vec!["title", "year", "tags", "extra"]);
        assert_eq!(fm.get_text("title"), Some("Intro"));
        assert!(matches!(fm.get("year"), Some(FieldValue::Other(_))));
        assert_eq!(fm.tags(), vec!["video", "Finance"]);

        let back = fm.to_yaml_mapping();
        assert_eq!(back.get("year"), Some(&Value::from(2024)));
    }

    #[test]
    fn test_scalar_tags_are_split() {
        let fm = parse("tags: video, pdf case-study\n");
        assert_eq!(fm.tags(), vec!["video", "pdf", "case-study"]);
    }

    #[test]
    fn test_non_string_tag_items_read_as_text() {
        let fm = parse("tags: [video, 2024, true, ~]\n");
        assert_eq!(fm.try_tags(), Some(vec!["video".into(), "2024".into(), "true".into(), String::new()]));

        let fm = parse("tags: 2024\n");
        assert_eq!(fm.tags(), vec!["2024"]);

        let fm = parse("tags:\n  - video\n  - nested: map\n");
        assert_eq!(fm.try_tags(), None);
        assert!(fm.tags().is_empty());

        assert_eq!(parse("title: x\n").try_tags(), Some(Vec::new()));
    }

    #[test]
    fn test_non_string_keys_survive_rewrite() {
        let fm = parse("2024: yes\ntrue: flag\ntitle: Intro\n");
        let keys: Vec<_> = fm.keys().collect();
        assert_eq!(keys, vec!["2024", "true", "title"]);
        assert!(fm.contains_key("2024"));

        let mut fm = fm;
        fm.insert("2024", "updated");
        let back = fm.to_yaml_mapping();
        let original: Vec<_> = back.keys().cloned().collect();
        assert_eq!(
            original,
            vec![Value::from(2024), Value::Bool(true), Value::from("title")]
        );
        assert_eq!(back.get(Value::from(2024)), Some(&Value::from("updated")));
    }

    #[test]
    fn test_insert_replaces_in_place() {
        let mut fm = parse("a: 1\nb: two\nc: 3\n");
        fm.insert("b", "updated");
        fm.insert("d", "new");
        let keys: Vec<_> = fm.keys().collect();
        assert_eq!(keys, vec!["a", "b", "c", "d"]);
        assert_eq!(fm.get_text("b"), Some("updated"));
        assert!(fm.remove("a").is_some());
        assert!(!fm.contains_key("a"));
    }

    #[test]
    fn test_blank_values() {
        let fm = parse("empty: ''\nnothing: ~\nlist: []\nset: x\n");
        assert!(!fm.has_value("empty"));
        assert!(!fm.has_value("nothing"));
        assert!(!fm.has_value("list"));
        assert!(fm.has_value("set"));
    }

    #[test]
    fn test_batch_result_folding() {
        let tracker = RunTracker::new();
        let mut result = BatchResult::new(false, &tracker);
        result.record(FolderOutcome::Processed(Some(PathBuf::from("/v/a/a.md"))));
        result.record(FolderOutcome::Skipped("exists".into()));
        result.record(FolderOutcome::Failed("boom".into()));
        let result = result.finish(&tracker);

        assert_eq!(result.total_folders, 3);
        assert_eq!((result.processed, result.skipped, result.failed), (1, 1, 1));
        assert!(!result.success);
        assert_eq!(result.exit_code(), 1);
    }

    #[test]
    fn test_outside_root_error_is_skipped() {
        let path = Path::new("/elsewhere/MBA");
        let outside = Error::path_outside_root(path, Path::new("/vault"));
        assert!(matches!(FolderOutcome::from_error(path, &outside), FolderOutcome::Skipped(_)));

        let missing = Error::file_not_found(path);
        match FolderOutcome::from_error(path, &missing) {
            FolderOutcome::Failed(message) => assert!(message.starts_with("/elsewhere/MBA: ")),
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[test]
    fn test_sync_result_folding() {
        let tracker = RunTracker::new();
        let mut result = SyncResult::new(true, &tracker);
        result.record(SyncOutcome::Synchronized);
        result.record(SyncOutcome::CreatedInVault(PathBuf::from("/v/b")));
        result.record(SyncOutcome::CreatedInSource(PathBuf::from("/s/c")));
        result.record(SyncOutcome::Skipped(PathBuf::from("/v/d")));
        let result = result.finish(&tracker);

        assert!(result.success);
        assert_eq!(result.total_folders, 4);
        assert_eq!(result.created_in_vault, 1);
        assert_eq!(result.created_in_source, 1);
        assert_eq!(result.created.len(), 2);
        assert_eq!(result.exit_code(), 0);
    }
}
