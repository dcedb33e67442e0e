//! Retention manager for the shared output directory.
//!
//! A pass runs in two phases over the regular, non-hidden files of the
//! directory:
//!
//! 1. **Age**: files older than the retention window are deleted, except the
//!    N most recently modified, which are always exempt.
//! 2. **Budget**: if the remaining total still exceeds the storage budget,
//!    the oldest non-exempt survivors are deleted until it fits.
//!
//! A failed deletion is logged and counted; the pass continues.

mod config;
mod manager;
mod types;

pub use config::RetentionConfig;
pub use manager::{RetentionManager, RetentionPolicy};
pub use types::{CleanupOutcome, CleanupStats, FileRecord, RetentionError, StorageInfo};
