// src/models/mod.rs

//! Domain models for the cover crawler.

mod config;
mod item;

// Re-export all public types
pub use config::{Config, ListingConfig, LoggingConfig, OutputConfig, PipelineConfig};
pub use item::{Artifact, ItemRecord, ListingPage, PageRequest};
