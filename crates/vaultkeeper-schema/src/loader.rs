//! Schema document loading.
//!
//! The schema is YAML with two required sections (`reserved_tags`,
//! `template_types`) and optional `universal_fields`, `type_mapping` and
//! `tag_prefixes`. Loading is all-or-nothing: any problem is a
//! [`Error::SchemaLoad`] and no partial schema is returned.

use crate::resolvers::ResolverKind;
use crate::normalize_tag;
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use vaultkeeper_core::{EXTRA_LEVEL, Error, FieldValue, ROOT_LEVEL, Result, TAGS_KEY, TEMPLATE_TYPE_KEY};

/// Built-in hierarchy level → index template type mapping
const DEFAULT_TYPE_MAPPING: &[(&str, &str)] = &[
    (ROOT_LEVEL, "main-index"),
    ("program", "program-index"),
    ("course", "course-index"),
    ("class", "class-index"),
    ("module", "module-index"),
    ("lesson", "lesson-index"),
    (EXTRA_LEVEL, "lesson-index"),
];

/// Template type used when a level has no mapping
pub const FALLBACK_INDEX_TYPE: &str = "index";

/// One field of a template type
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub name: String,
    pub required: bool,
    /// Explicit resolver from the schema's hint
    pub resolver: Option<ResolverKind>,
    /// Literal default value
    pub default: Option<FieldValue>,
}

impl FieldSpec {
    /// Optional field with no hint
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            required: false,
            resolver: None,
            default: None,
        }
    }
}

/// Loaded, immutable metadata schema
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Schema {
    /// Normalized reserved tag names
    pub reserved_tags: BTreeSet<String>,
    /// Template type → field specs
    pub template_types: BTreeMap<String, Vec<FieldSpec>>,
    /// Hierarchy level (or note kind) → template type
    pub type_mapping: BTreeMap<String, String>,
    /// Fields every note carries
    pub universal_fields: BTreeSet<String>,
    /// Free-form tag prefixes that are always accepted
    pub tag_prefixes: Vec<String>,
}

impl Schema {
    /// Field specs of a template type
    pub fn fields_for(&self, template_type: &str) -> Option<&[FieldSpec]> {
        self.template_types.get(template_type).map(Vec::as_slice)
    }

    /// Whether the schema defines a template type
    pub fn has_template_type(&self, template_type: &str) -> bool {
        self.template_types.contains_key(template_type)
    }

    /// Universal fields, the template type's fields, `tags` and `template-type`
    pub fn known_fields(&self, template_type: Option<&str>) -> BTreeSet<&str> {
        let mut known: BTreeSet<&str> = self.universal_fields.iter().map(String::as_str).collect();
        known.insert(TAGS_KEY);
        known.insert(TEMPLATE_TYPE_KEY);
        if let Some(fields) = template_type.and_then(|t| self.fields_for(t)) {
            known.extend(fields.iter().map(|f| f.name.as_str()));
        }
        known
    }

    /// Whether a normalized tag is reserved
    pub fn is_reserved(&self, tag: &str) -> bool {
        self.reserved_tags.contains(tag)
    }

    /// Whether a normalized tag falls under a free-form prefix
    pub fn matches_prefix(&self, tag: &str) -> bool {
        self.tag_prefixes.iter().any(|p| tag.starts_with(p.as_str()))
    }

    /// Index template type for a hierarchy level name
    pub fn template_type_for_level(&self, level_name: &str) -> &str {
        self.type_mapping
            .get(level_name)
            .map(String::as_str)
            .unwrap_or(FALLBACK_INDEX_TYPE)
    }

    /// Whether a template type names a generated index.
    ///
    /// `type_mapping` entries keyed by a reserved tag describe note kinds,
    /// every other entry maps a hierarchy level to an index type.
    pub fn is_index_type(&self, template_type: &str) -> bool {
        template_type == FALLBACK_INDEX_TYPE
            || template_type.ends_with("-index")
            || self
                .type_mapping
                .iter()
                .any(|(key, t)| t == template_type && !self.is_reserved(key))
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawSchema {
    reserved_tags: Option<Vec<String>>,
    template_types: Option<BTreeMap<String, Vec<RawField>>>,
    #[serde(default)]
    type_mapping: BTreeMap<String, String>,
    #[serde(default)]
    universal_fields: Vec<String>,
    #[serde(default)]
    tag_prefixes: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawField {
    Name(String),
    Spec {
        name: String,
        #[serde(default)]
        required: bool,
        resolver: Option<String>,
        default: Option<serde_yaml::Value>,
    },
}

/// Reads schema documents
pub struct SchemaLoader;

impl SchemaLoader {
    /// Load and validate a schema file
    #[tracing::instrument(name = "schema_load")]
    pub async fn load(path: &Path) -> Result<Schema> {
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| Error::schema_load(path, format!("cannot read file: {}", e)))?;
        let schema = Self::parse(&text, path)?;
        tracing::info!(
            reserved_tags = schema.reserved_tags.len(),
            template_types = schema.template_types.len(),
            universal_fields = schema.universal_fields.len(),
            "Loaded schema"
        );
        Ok(schema)
    }

    /// Parse schema text that did not come from a file
    pub fn from_str(text: &str) -> Result<Schema> {
        Self::parse(text, Path::new("<inline>"))
    }

    /// Parse schema text; `origin` is only used in error messages
    pub fn parse(text: &str, origin: &Path) -> Result<Schema> {
        let raw: RawSchema = serde_yaml::from_str(text)
            .map_err(|e| Error::schema_load(origin, format!("invalid YAML: {}", e)))?;

        let reserved = raw
            .reserved_tags
            .ok_or_else(|| Error::schema_load(origin, "missing required section 'reserved_tags'"))?;
        let templates = raw
            .template_types
            .ok_or_else(|| Error::schema_load(origin, "missing required section 'template_types'"))?;

        let reserved_tags = reserved.iter().filter_map(|t| normalize_tag(t)).collect();

        let mut template_types = BTreeMap::new();
        for (type_name, raw_fields) in templates {
            let mut fields: Vec<FieldSpec> = Vec::with_capacity(raw_fields.len());
            for raw_field in raw_fields {
                let spec = Self::field_spec(raw_field, &type_name, origin)?;
                if fields.iter().any(|f| f.name == spec.name) {
                    return Err(Error::schema_load(
                        origin,
                        format!("template type '{}' lists field '{}' twice", type_name, spec.name),
                    ));
                }
                fields.push(spec);
            }
            template_types.insert(type_name, fields);
        }

        let mut type_mapping: BTreeMap<String, String> = DEFAULT_TYPE_MAPPING
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        type_mapping.extend(raw.type_mapping);

        let tag_prefixes = raw
            .tag_prefixes
            .iter()
            .map(|p| p.trim().trim_start_matches('#').to_lowercase())
            .filter(|p| !p.is_empty())
            .collect();

        Ok(Schema {
            reserved_tags,
            template_types,
            type_mapping,
            universal_fields: raw.universal_fields.into_iter().collect(),
            tag_prefixes,
        })
    }

    fn field_spec(raw: RawField, type_name: &str, origin: &Path) -> Result<FieldSpec> {
        match raw {
            RawField::Name(name) => Ok(FieldSpec::named(name)),
            RawField::Spec {
                name,
                required,
                resolver,
                default,
            } => {
                let resolver = resolver
                    .map(|hint| ResolverKind::parse_hint(&hint))
                    .transpose()
                    .map_err(|e| {
                        Error::schema_load(
                            origin,
                            format!("field '{}' of '{}': {}", name, type_name, e),
                        )
                    })?;
                Ok(FieldSpec {
                    name,
                    required,
                    resolver,
                    default: default.map(FieldValue::from_yaml),
                })
            }
        }
    }
}
