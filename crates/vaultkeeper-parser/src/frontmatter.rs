//! Frontmatter extraction: ---\nYAML\n---
//!
//! Only the header block is interpreted. The body is carried as an opaque
//! string so that rewriting a note's metadata never alters its content.

use regex::Regex;
use serde_yaml::Value;
use std::sync::LazyLock;
use vaultkeeper_core::{Error, FrontmatterMap, Result};

/// Matches a leading YAML frontmatter block: --- ... ---
static FRONTMATTER_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\A---[ \t]*\r?\n(?:([\s\S]*?)\r?\n)?---[ \t]*(?:\r?\n|\z)")
        .expect("frontmatter pattern is valid")
});

/// A note split into its header and body
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedNote {
    /// Parsed header, `None` when the note has no frontmatter block
    pub frontmatter: Option<FrontmatterMap>,
    /// Everything after the header, byte for byte
    pub body: String,
}

impl ParsedNote {
    /// Header, or an empty map when absent
    pub fn frontmatter_or_default(&self) -> FrontmatterMap {
        self.frontmatter.clone().unwrap_or_default()
    }
}

/// Split note content into frontmatter and body.
///
/// A block that is present but not a YAML mapping is a parse error; a note
/// without a block parses with `frontmatter: None`.
pub fn split(content: &str) -> Result<ParsedNote> {
    let Some(caps) = FRONTMATTER_PATTERN.captures(content) else {
        return Ok(ParsedNote {
            frontmatter: None,
            body: content.to_string(),
        });
    };

    let yaml = caps.get(1).map(|m| m.as_str()).unwrap_or("");
    let end = caps.get(0).map(|m| m.end()).unwrap_or(0);

    let value: Value = if yaml.trim().is_empty() {
        Value::Null
    } else {
        serde_yaml::from_str(yaml)
            .map_err(|e| Error::parse_error(format!("Invalid frontmatter YAML: {}", e)))?
    };

    let frontmatter = match value {
        Value::Null => FrontmatterMap::new(),
        Value::Mapping(mapping) => FrontmatterMap::from_yaml_mapping(mapping)?,
        other => {
            return Err(Error::parse_error(format!(
                "Frontmatter must be a mapping, found {}",
                yaml_kind(&other)
            )));
        }
    };

    Ok(ParsedNote {
        frontmatter: Some(frontmatter),
        body: content[end..].to_string(),
    })
}

/// Render frontmatter and body back into note content
pub fn render(frontmatter: &FrontmatterMap, body: &str) -> Result<String> {
    let yaml = serde_yaml::to_string(&frontmatter.to_yaml_mapping())
        .map_err(|e| Error::parse_error(format!("Failed to render frontmatter: {}", e)))?;

    let mut out = String::with_capacity(yaml.len() + body.len() + 8);
    out.push_str("---\n");
    if !frontmatter.is_empty() {
        out.push_str(&yaml);
        if !yaml.ends_with('\n') {
            out.push('\n');
        }
    }
    out.push_str("---\n");
    out.push_str(body);
    Ok(out)
}

fn yaml_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a list",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_frontmatter() {
        let note = split("---\ntitle: Test\n---\nContent here").unwrap();
        let fm = note.frontmatter.unwrap();
        assert_eq!(fm.get_text("title"), Some("Test"));
        assert_eq!(note.body, "Content here");
    }

    #[test]
    fn test_multiline_frontmatter() {
        let note = split("---\ntitle: Test\ntags:\n  - rust\n  - parser\n---\nContent").unwrap();
        assert_eq!(note.frontmatter.unwrap().tags(), vec!["rust", "parser"]);
    }

    #[test]
    fn test_no_frontmatter() {
        let content = "Just content\nNo frontmatter";
        let note = split(content).unwrap();
        assert!(note.frontmatter.is_none());
        assert_eq!(note.body, content);
    }

    #[test]
    fn test_empty_block() {
        let note = split("---\n---\n# Body\n").unwrap();
        assert!(note.frontmatter.unwrap().is_empty());
        assert_eq!(note.body, "# Body\n");
    }

    #[test]
    fn test_block_at_end_of_file() {
        let note = split("---\ntitle: Test\n---").unwrap();
        assert!(note.frontmatter.is_some());
        assert_eq!(note.body, "");
    }

    #[test]
    fn test_unclosed_block_is_body() {
        let note = split("---\ntitle: Test\nNo closing").unwrap();
        assert!(note.frontmatter.is_none());
    }

    #[test]
    fn test_non_mapping_is_error() {
        assert!(split("---\n- a\n- b\n---\nBody").is_err());
        assert!(split("---\ntitle: [unclosed\n---\nBody").is_err());
    }

    #[test]
    fn test_render_preserves_body_and_order() {
        let content = "---\ntitle: Test\ntags:\n- video\nyear: 2024\n---\n\n# Heading\n\nText with --- inside\n";
        let note = split(content).unwrap();
        let rendered = render(note.frontmatter.as_ref().unwrap(), &note.body).unwrap();

        assert!(rendered.starts_with("---\ntitle: Test\n"));
        assert!(rendered.ends_with("\n---\n\n# Heading\n\nText with --- inside\n"));
        let again = split(&rendered).unwrap();
        assert_eq!(again, note);
    }

    #[test]
    fn test_crlf_frontmatter() {
        let note = split("---\r\ntitle: Test\r\n---\r\nBody\r\n").unwrap();
        assert_eq!(note.frontmatter.unwrap().get_text("title"), Some("Test"));
        assert_eq!(note.body, "Body\r\n");
    }
}
