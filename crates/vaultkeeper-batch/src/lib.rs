//! # Vaultkeeper Batch
//!
//! Whole-subtree operations. Each walk visits every folder (or note) once,
//! recovers per-item failures locally and returns a result record whose
//! counters are folded by a single consumer:
//!
//! - [`VaultIndexBatchProcessor`]: one index note per folder
//! - [`IndexCleaner`]: removes generated indexes
//! - [`MetadataBatchProcessor`]: schema enforcement on every note
//! - [`VaultFolderSyncProcessor`]: mirrors directory structure between the
//!   vault and the source tree
//!
//! Folder-level work runs on a bounded pool (`config.max_concurrency`).
//!
//! ```no_run
//! use std::sync::Arc;
//! use vaultkeeper_batch::prelude::*;
//!
//! # async fn example() -> Result<()> {
//! let config = AppConfig::builder("/vault").source_root("/onedrive").build()?;
//! let sync = VaultFolderSyncProcessor::new(Arc::new(config));
//! let result = sync
//!     .sync_directories(SyncRequest { dry_run: true, ..Default::default() })
//!     .await?;
//! println!("{} directories would be created", result.created.len());
//! # Ok(())
//! # }
//! ```

pub mod clean_index;
pub mod folder_sync;
pub mod index_batch;
pub mod metadata_batch;

pub use clean_index::IndexCleaner;
pub use folder_sync::{DirectoryCreator, FsDirectoryCreator, SyncRequest, VaultFolderSyncProcessor};
pub use index_batch::{IndexBatchOptions, VaultIndexBatchProcessor};
pub use metadata_batch::{MetadataBatchProcessor, MetadataBatchResult};

pub mod prelude {
    pub use crate::clean_index::IndexCleaner;
    pub use crate::folder_sync::{SyncRequest, VaultFolderSyncProcessor};
    pub use crate::index_batch::{IndexBatchOptions, VaultIndexBatchProcessor};
    pub use crate::metadata_batch::{MetadataBatchProcessor, MetadataBatchResult};
    pub use vaultkeeper_core::prelude::*;
}
