//! Field value resolution.
//!
//! Every resolvable field gets exactly one [`ResolverKind`], chosen once when
//! the registry is built. Resolution is pure: the current date is part of the
//! [`ResolveContext`] rather than read from the clock.

use crate::loader::{FieldSpec, Schema};
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use vaultkeeper_core::{
    AUTO_GENERATED_STATE_KEY, FieldValue, FrontmatterMap, HierarchyLevels, TEMPLATE_TYPE_KEY,
};

/// Part of the note path a path resolver extracts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathPart {
    /// File stem, title-cased with separators turned into spaces
    Title,
    /// File stem as-is
    Stem,
    /// Name of the containing folder
    Folder,
    /// Vault-relative path
    Relative,
}

/// How a field's value is computed
#[derive(Debug, Clone, PartialEq)]
pub enum ResolverKind {
    /// Fixed value
    Literal(FieldValue),
    /// Value of a named hierarchy level
    Hierarchy(String),
    /// Derived from the note path
    Path(PathPart),
    /// Today's date, ISO formatted
    Today,
    /// The template type the note is processed as
    TemplateType,
}

impl ResolverKind {
    /// Parse a schema resolver hint such as `hierarchy:course` or `path:title`
    pub fn parse_hint(hint: &str) -> Result<Self, String> {
        let hint = hint.trim();
        let (kind, arg) = match hint.split_once(':') {
            Some((k, a)) => (k.trim(), Some(a.trim())),
            None => (hint, None),
        };

        match (kind, arg) {
            ("literal", Some(value)) => Ok(Self::Literal(FieldValue::from(value))),
            ("hierarchy", Some(level)) if !level.is_empty() => Ok(Self::Hierarchy(level.to_string())),
            ("path", Some(part)) => match part {
                "title" => Ok(Self::Path(PathPart::Title)),
                "stem" => Ok(Self::Path(PathPart::Stem)),
                "folder" => Ok(Self::Path(PathPart::Folder)),
                "relative" => Ok(Self::Path(PathPart::Relative)),
                other => Err(format!("unknown path part '{}'", other)),
            },
            ("date", Some("today")) | ("today", None) => Ok(Self::Today),
            ("template-type", None) => Ok(Self::TemplateType),
            _ => Err(format!("unrecognized resolver hint '{}'", hint)),
        }
    }

    /// Choose the resolver for a field from its spec and name
    pub fn for_field(name: &str, spec: Option<&FieldSpec>, level_names: &[String]) -> Option<Self> {
        if let Some(spec) = spec {
            if let Some(kind) = &spec.resolver {
                return Some(kind.clone());
            }
            if let Some(default) = &spec.default {
                return Some(Self::Literal(default.clone()));
            }
        }

        match name {
            "title" => Some(Self::Path(PathPart::Title)),
            TEMPLATE_TYPE_KEY => Some(Self::TemplateType),
            AUTO_GENERATED_STATE_KEY => Some(Self::Literal(FieldValue::from("writable"))),
            n if n.starts_with("date-") => Some(Self::Today),
            n if level_names.iter().any(|l| l == n) => Some(Self::Hierarchy(n.to_string())),
            _ => None,
        }
    }

    /// Compute the value, or `None` when the context lacks what is needed
    pub fn resolve(&self, ctx: &ResolveContext<'_>) -> Option<FieldValue> {
        match self {
            Self::Literal(value) => Some(value.clone()),
            Self::Hierarchy(level) => ctx.levels.get(level).map(FieldValue::from),
            Self::Path(part) => resolve_path(*part, ctx.note_path).map(FieldValue::from),
            Self::Today => Some(FieldValue::from(ctx.today.format("%Y-%m-%d").to_string())),
            Self::TemplateType => ctx.template_type.map(FieldValue::from),
        }
    }
}

impl fmt::Display for ResolverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(v) => write!(f, "literal:{:?}", v),
            Self::Hierarchy(level) => write!(f, "hierarchy:{}", level),
            Self::Path(part) => write!(f, "path:{:?}", part),
            Self::Today => f.write_str("date:today"),
            Self::TemplateType => f.write_str("template-type"),
        }
    }
}

fn resolve_path(part: PathPart, path: &Path) -> Option<String> {
    match part {
        PathPart::Title => {
            let stem = path.file_stem()?.to_string_lossy();
            let spaced = stem.replace(['-', '_'], " ");
            let spaced = spaced.split_whitespace().collect::<Vec<_>>().join(" ");
            (!spaced.is_empty()).then(|| titlecase::titlecase(&spaced))
        }
        PathPart::Stem => Some(path.file_stem()?.to_string_lossy().into_owned()),
        PathPart::Folder => Some(path.parent()?.file_name()?.to_string_lossy().into_owned()),
        PathPart::Relative => Some(path.to_string_lossy().replace('\\', "/")),
    }
}

/// Everything a resolver may look at
#[derive(Debug, Clone, Copy)]
pub struct ResolveContext<'a> {
    /// Vault-relative note path
    pub note_path: &'a Path,
    /// Frontmatter as currently known
    pub frontmatter: &'a FrontmatterMap,
    /// Hierarchy levels of the note's folder
    pub levels: &'a HierarchyLevels,
    /// Template type the note is processed as
    pub template_type: Option<&'a str>,
    /// Current date
    pub today: NaiveDate,
}

/// Two resolvers proposed for one field; the first one was kept
#[derive(Debug, Clone, PartialEq)]
pub struct ResolverConflict {
    pub field: String,
    pub kept: ResolverKind,
    pub ignored: ResolverKind,
}

/// Field name → resolver lookup, built once per run
#[derive(Debug, Clone, Default)]
pub struct FieldResolverRegistry {
    resolvers: BTreeMap<String, ResolverKind>,
    conflicts: Vec<ResolverConflict>,
}

impl FieldResolverRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a schema: universal fields first, then every template
    /// type's fields in name order.
    pub fn from_schema(schema: &Schema, level_names: &[String]) -> Self {
        let mut registry = Self::new();

        for name in &schema.universal_fields {
            if let Some(kind) = ResolverKind::for_field(name, None, level_names) {
                registry.register(name, kind);
            }
        }

        for fields in schema.template_types.values() {
            for spec in fields {
                if let Some(kind) = ResolverKind::for_field(&spec.name, Some(spec), level_names) {
                    registry.register(&spec.name, kind);
                }
            }
        }

        tracing::debug!(
            resolvers = registry.resolvers.len(),
            conflicts = registry.conflicts.len(),
            "Built field resolver registry"
        );
        registry
    }

    /// Register a resolver. The first registration for a field wins; a
    /// different later one is recorded as a conflict. Returns whether the
    /// resolver was stored.
    pub fn register(&mut self, field: &str, kind: ResolverKind) -> bool {
        match self.resolvers.get(field) {
            None => {
                self.resolvers.insert(field.to_string(), kind);
                true
            }
            Some(existing) if *existing == kind => false,
            Some(existing) => {
                tracing::warn!(
                    field,
                    kept = %existing,
                    ignored = %kind,
                    "Conflicting resolvers for field; keeping the first"
                );
                self.conflicts.push(ResolverConflict {
                    field: field.to_string(),
                    kept: existing.clone(),
                    ignored: kind,
                });
                false
            }
        }
    }

    /// Resolve a field; `None` when no resolver exists or it yields nothing
    pub fn resolve(&self, field: &str, ctx: &ResolveContext<'_>) -> Option<FieldValue> {
        self.resolvers.get(field)?.resolve(ctx)
    }

    /// Resolver registered for a field
    pub fn get(&self, field: &str) -> Option<&ResolverKind> {
        self.resolvers.get(field)
    }

    /// Whether a field has a resolver
    pub fn has_resolver(&self, field: &str) -> bool {
        self.resolvers.contains_key(field)
    }

    /// Conflicts recorded while building
    pub fn conflicts(&self) -> &[ResolverConflict] {
        &self.conflicts
    }

    pub fn len(&self) -> usize {
        self.resolvers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resolvers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::SchemaLoader;
    use vaultkeeper_core::MetadataHierarchyDetector;

    fn levels() -> Vec<String> {
        vec!["program".into(), "course".into(), "class".into()]
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 14).unwrap()
    }

    #[test]
    fn test_parse_hints() {
        assert_eq!(
            ResolverKind::parse_hint("hierarchy:course").unwrap(),
            ResolverKind::Hierarchy("course".into())
        );
        assert_eq!(
            ResolverKind::parse_hint("path: title").unwrap(),
            ResolverKind::Path(PathPart::Title)
        );
        assert_eq!(ResolverKind::parse_hint("date:today").unwrap(), ResolverKind::Today);
        assert_eq!(
            ResolverKind::parse_hint("literal:draft").unwrap(),
            ResolverKind::Literal(FieldValue::from("draft"))
        );
        assert!(ResolverKind::parse_hint("path:colour").is_err());
        assert!(ResolverKind::parse_hint("magic").is_err());
    }

    #[test]
    fn test_rule_table() {
        let names = levels();
        assert_eq!(
            ResolverKind::for_field("title", None, &names),
            Some(ResolverKind::Path(PathPart::Title))
        );
        assert_eq!(ResolverKind::for_field("date-created", None, &names), Some(ResolverKind::Today));
        assert_eq!(
            ResolverKind::for_field("course", None, &names),
            Some(ResolverKind::Hierarchy("course".into()))
        );
        assert_eq!(ResolverKind::for_field("status", None, &names), None);
    }

    #[test]
    fn test_resolve_from_context() {
        let detector = MetadataHierarchyDetector::new("/vault", levels());
        let note = Path::new("MBA/Finance/intro-to_valuation.md");
        let levels = detector.detect_note(note).unwrap();
        let fm = FrontmatterMap::new();
        let ctx = ResolveContext {
            note_path: note,
            frontmatter: &fm,
            levels: &levels,
            template_type: Some("video-reference"),
            today: today(),
        };

        let mut registry = FieldResolverRegistry::new();
        registry.register("title", ResolverKind::Path(PathPart::Title));
        registry.register("course", ResolverKind::Hierarchy("course".into()));
        registry.register("class", ResolverKind::Hierarchy("class".into()));
        registry.register("date-created", ResolverKind::Today);
        registry.register("template-type", ResolverKind::TemplateType);
        registry.register("folder", ResolverKind::Path(PathPart::Folder));

        assert_eq!(registry.resolve("title", &ctx), Some(FieldValue::from("Intro to Valuation")));
        assert_eq!(registry.resolve("course", &ctx), Some(FieldValue::from("Finance")));
        assert_eq!(registry.resolve("class", &ctx), None);
        assert_eq!(registry.resolve("date-created", &ctx), Some(FieldValue::from("2026-03-14")));
        assert_eq!(registry.resolve("template-type", &ctx), Some(FieldValue::from("video-reference")));
        assert_eq!(registry.resolve("folder", &ctx), Some(FieldValue::from("Finance")));
        assert_eq!(registry.resolve("unregistered", &ctx), None);
    }

    #[test]
    fn test_first_registration_wins() {
        let mut registry = FieldResolverRegistry::new();
        assert!(registry.register("status", ResolverKind::Literal(FieldValue::from("unread"))));
        assert!(!registry.register("status", ResolverKind::Literal(FieldValue::from("unread"))));
        assert!(registry.conflicts().is_empty());

        assert!(!registry.register("status", ResolverKind::Literal(FieldValue::from("done"))));
        assert_eq!(registry.conflicts().len(), 1);
        assert_eq!(
            registry.get("status"),
            Some(&ResolverKind::Literal(FieldValue::from("unread")))
        );
    }

    #[test]
    fn test_from_schema_is_deterministic() {
        let yaml = r#"
reserved_tags: [video]
universal_fields: [auto-generated-state, date-created]
template_types:
  video-reference:
    - title
    - name: status
      default: unread
  pdf-reference:
    - title
    - name: status
      default: to-read
    - name: program
      resolver: "hierarchy:program"
"#;
        let schema = SchemaLoader::parse(yaml, Path::new("schema.yaml")).unwrap();
        let a = FieldResolverRegistry::from_schema(&schema, &levels());
        let b = FieldResolverRegistry::from_schema(&schema, &levels());

        assert_eq!(a.len(), b.len());
        // pdf-reference sorts first, so its default is kept
        assert_eq!(a.get("status"), Some(&ResolverKind::Literal(FieldValue::from("to-read"))));
        assert_eq!(a.conflicts().len(), 1);
        assert_eq!(a.conflicts(), b.conflicts());
        assert!(a.has_resolver("auto-generated-state"));
        assert!(a.has_resolver("program"));
    }
}
