//! # Vaultkeeper Schema
//!
//! Declarative metadata schema: reserved tags, template types with their
//! field specs, universal fields, and the registry of field value resolvers
//! built from them.
//!
//! ```
//! use std::path::Path;
//! use vaultkeeper_schema::{FieldResolverRegistry, SchemaLoader, normalize_tag};
//!
//! let schema = SchemaLoader::parse(
//!     "reserved_tags: [video]\ntemplate_types:\n  video-reference: [title]\n",
//!     Path::new("metadata.yaml"),
//! ).unwrap();
//!
//! assert!(schema.is_reserved(&normalize_tag("Video ").unwrap()));
//!
//! let registry = FieldResolverRegistry::from_schema(&schema, &["program".to_string()]);
//! assert!(registry.has_resolver("title"));
//! ```

pub mod loader;
pub mod resolvers;

pub use loader::{FALLBACK_INDEX_TYPE, FieldSpec, Schema, SchemaLoader};
pub use resolvers::{FieldResolverRegistry, PathPart, ResolveContext, ResolverConflict, ResolverKind};

/// Normalize a tag for comparison: strip `#`, trim, lower-case, and join
/// inner whitespace runs with `-`. Blank tags normalize to `None`.
pub fn normalize_tag(raw: &str) -> Option<String> {
    let trimmed = raw.trim().trim_start_matches('#').trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.split_whitespace().collect::<Vec<_>>().join("-").to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_tag() {
        assert_eq!(normalize_tag("Video "), Some("video".to_string()));
        assert_eq!(normalize_tag("  #PDF"), Some("pdf".to_string()));
        assert_eq!(normalize_tag("Case  Study"), Some("case-study".to_string()));
        assert_eq!(normalize_tag("course/Finance"), Some("course/finance".to_string()));
        assert_eq!(normalize_tag(" # "), None);
    }
}
