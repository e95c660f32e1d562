// src/utils/http.rs

//! Shared HTTP client for listing and cover requests.

use std::time::Duration;

use crate::error::{AppError, Result};
use crate::models::{ListingConfig, PipelineConfig};

/// Upper bound on connection setup, independent of the request timeout.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Build the client shared by the fetch and download stages.
///
/// Every request carries the configured User-Agent, including cover
/// downloads, which set no headers of their own. The idle pool holds one
/// connection per concurrent download.
pub fn crawl_client(
    listing: &ListingConfig,
    pipeline: &PipelineConfig,
) -> Result<reqwest::Client> {
    if listing.timeout_secs == 0 {
        return Err(AppError::config("listing.timeout_secs must be > 0"));
    }
    let timeout = Duration::from_secs(listing.timeout_secs);

    let client = reqwest::Client::builder()
        .user_agent(&listing.user_agent)
        .timeout(timeout)
        .connect_timeout(CONNECT_TIMEOUT.min(timeout))
        .pool_max_idle_per_host(pipeline.max_download_concurrency.max(1))
        .build()?;
    Ok(client)
}
