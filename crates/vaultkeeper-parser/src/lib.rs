//! # Vaultkeeper Parser
//!
//! Frontmatter extraction and rendering for vault notes.
//!
//! ```
//! use vaultkeeper_parser::{render, split};
//!
//! let note = split("---\ntitle: Lecture 1\ntags: [Video]\n---\n# Notes\n").unwrap();
//! let mut fm = note.frontmatter_or_default();
//! assert_eq!(fm.tags(), vec!["Video"]);
//!
//! fm.set_tags(vec!["video".to_string()]);
//! let content = render(&fm, &note.body).unwrap();
//! assert!(content.ends_with("---\n# Notes\n"));
//! ```

pub mod frontmatter;

pub use frontmatter::{ParsedNote, render, split};
