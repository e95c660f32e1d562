// src/services/mod.rs

//! Remote services used by the pipeline stages.
//!
//! Each stage talks to its collaborator through a trait so the pipeline can
//! be driven by in-memory fakes in tests.

mod covers;
mod listing;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{Artifact, ItemRecord, PageRequest};

pub use covers::HttpArtifactDownloader;
pub use listing::HttpPageFetcher;

/// Fetches one page of the listing.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Request a single page. Does not retry.
    async fn fetch(&self, request: PageRequest) -> Result<Vec<ItemRecord>>;
}

/// Downloads the cover referenced by an item.
#[async_trait]
pub trait ArtifactDownloader: Send + Sync {
    async fn download(&self, item: &ItemRecord) -> Result<Artifact>;
}
