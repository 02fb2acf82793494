//! # Vaultkeeper Vault
//!
//! Per-note and per-folder operations on a vault:
//!
//! - [`notes::NoteStore`] reads notes, writes frontmatter atomically
//!   (write-to-temp then rename), inventories folders and walks subtrees
//! - [`tags::TagProcessor`] normalizes tags and fills schema fields on one
//!   note, in [`tags::ProcessingMode::DryRun`] or
//!   [`tags::ProcessingMode::Apply`]
//! - [`index::VaultIndexProcessor`] writes the index note of one folder
//!
//! Batch walks over many folders live in `vaultkeeper-batch`.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::path::Path;
//! use std::sync::Arc;
//! use vaultkeeper_vault::prelude::*;
//! use vaultkeeper_schema::{FieldResolverRegistry, SchemaLoader};
//!
//! # async fn example() -> Result<()> {
//! let config = AppConfig::builder("/path/to/vault").build()?;
//! let schema = Arc::new(SchemaLoader::load(Path::new("/path/to/metadata.yaml")).await?);
//! let registry = Arc::new(FieldResolverRegistry::from_schema(&schema, &config.level_names));
//!
//! let mut processor = TagProcessor::new(schema, registry, &config, ProcessingMode::DryRun);
//! let outcome = processor.process_note(Path::new("MBA/Finance/Lecture 1.md")).await?;
//! println!("rejected tags: {:?}", outcome.rejected);
//! # Ok(())
//! # }
//! ```

pub mod index;
pub mod notes;
pub mod tags;

pub use index::{IndexOptions, IndexOutcome, READ_ONLY_STATE, VaultIndexProcessor, WRITABLE_STATE};
pub use notes::{FolderInventory, NOTE_EXTENSION, NoteEntry, NoteStore, is_note};
pub use tags::{NoteOutcome, ProcessingMode, TagProcessor, TagStats};

pub use vaultkeeper_core::{Error, Result};

pub mod prelude {
    pub use crate::index::{IndexOptions, IndexOutcome, VaultIndexProcessor};
    pub use crate::notes::{FolderInventory, NoteStore};
    pub use crate::tags::{NoteOutcome, ProcessingMode, TagProcessor, TagStats};
    pub use vaultkeeper_core::prelude::*;
}
