//! Storage abstractions for cover persistence.
//!
//! ## Directory Structure
//!
//! ```text
//! {destination_dir}/
//! ├── 肖申克的救赎.jpg
//! ├── AC-DC- Let There Be Rock.jpg
//! └── ...
//! ```

pub mod local;

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::error::Result;

// Re-export for convenience
pub use local::LocalStorage;

/// Trait for cover storage backends.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Make sure the destination root exists before any work starts.
    async fn prepare(&self, destination_dir: &Path) -> Result<()>;

    /// Persist one cover under `key`, returning the final path.
    ///
    /// A reader never observes a partially written file.
    async fn save(&self, key: &str, payload: &[u8], destination_dir: &Path) -> Result<PathBuf>;
}
