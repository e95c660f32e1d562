// src/pipeline/crawl.rs

//! Cover crawling entry point.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::error::Result;
use crate::models::Config;
use crate::services::{HttpArtifactDownloader, HttpPageFetcher};
use crate::storage::LocalStorage;
use crate::utils::http;

use super::coordinator::{Pipeline, RetryPolicy, StageLimits};
use super::summary::RunSummary;

impl Pipeline {
    /// Build a pipeline talking to the configured listing endpoint and
    /// writing to the local filesystem.
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = http::crawl_client(&config.listing, &config.pipeline)?;
        let fetcher = HttpPageFetcher::new(client.clone(), &config.listing)?;
        let downloader = HttpArtifactDownloader::new(client);
        let store = LocalStorage::new(config.output.extension.clone());

        Ok(Self::new(Arc::new(fetcher), Arc::new(downloader), Arc::new(store))
            .with_limits(StageLimits::from(&config.pipeline))
            .with_retry(RetryPolicy {
                retries: config.listing.retries,
                delay: Duration::from_millis(config.listing.retry_delay_ms),
            }))
    }
}

/// Run the cover crawler with the given configuration.
pub async fn run_crawler(config: &Config, cancel: CancellationToken) -> Result<RunSummary> {
    let pipeline = Pipeline::from_config(config)?.with_cancellation(cancel);

    let summary = pipeline
        .run(
            config.pipeline.total_pages,
            config.pipeline.page_size,
            &config.output.destination_dir,
        )
        .await?;

    for (stage, failure) in summary.failures() {
        log::warn!("[{}] {}: {}", stage, failure.subject, failure.error);
    }

    Ok(summary)
}
