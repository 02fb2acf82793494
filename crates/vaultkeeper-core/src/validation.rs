//! Non-fatal schema validation warnings.
//!
//! Warnings never stop processing; they are accumulated per note and folded
//! into batch statistics.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Kind of schema deviation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WarningKind {
    /// A required or universal field could not be resolved
    MissingRequired,
    /// A key that no schema field describes
    UnknownField,
    /// The note names a template type the schema does not define
    UnknownTemplateType,
    /// Frontmatter present but not a mapping
    MalformedFrontmatter,
    /// `tags` holds nested values that cannot be read as tags
    MalformedTags,
}

impl WarningKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MissingRequired => "missing-required",
            Self::UnknownField => "unknown-field",
            Self::UnknownTemplateType => "unknown-template-type",
            Self::MalformedFrontmatter => "malformed-frontmatter",
            Self::MalformedTags => "malformed-tags",
        }
    }
}

impl fmt::Display for WarningKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single schema warning for one note
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaWarning {
    pub kind: WarningKind,
    /// Note the warning applies to
    pub path: PathBuf,
    /// Field involved, if any
    pub field: Option<String>,
    pub message: String,
}

impl SchemaWarning {
    /// Create a new warning
    pub fn new(kind: WarningKind, path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self {
            kind,
            path: path.into(),
            field: None,
            message: message.into(),
        }
    }

    /// Attach the field name
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }
}

impl fmt::Display for SchemaWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.kind, self.path.display(), self.message)
    }
}
