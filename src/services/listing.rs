// src/services/listing.rs

//! Listing API client.

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::USER_AGENT;
use url::Url;

use crate::error::{AppError, ListingFailure, Result};
use crate::models::{ItemRecord, ListingConfig, ListingPage, PageRequest};

use super::PageFetcher;

/// Page fetcher backed by the HTTP listing endpoint.
#[derive(Clone)]
pub struct HttpPageFetcher {
    client: Client,
    endpoint: Url,
    media_type: String,
    tag: String,
    sort: String,
    user_agent: String,
}

impl HttpPageFetcher {
    /// Create a fetcher for the configured endpoint.
    pub fn new(client: Client, config: &ListingConfig) -> Result<Self> {
        Ok(Self {
            client,
            endpoint: Url::parse(&config.endpoint)?,
            media_type: config.media_type.clone(),
            tag: config.tag.clone(),
            sort: config.sort.clone(),
            user_agent: config.user_agent.clone(),
        })
    }

    /// Build the request URL for a page.
    fn page_url(&self, request: PageRequest) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("type", &self.media_type)
            .append_pair("tag", &self.tag)
            .append_pair("sort", &self.sort)
            .append_pair("page_limit", &request.limit.to_string())
            .append_pair("page_start", &request.offset.to_string());
        url
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch(&self, request: PageRequest) -> Result<Vec<ItemRecord>> {
        let url = self.page_url(request);
        log::debug!("Fetching listing page {} ({})", request.index, url);

        let response = self
            .client
            .get(url)
            .header(USER_AGENT, &self.user_agent)
            .send()
            .await
            .map_err(|e| AppError::listing(request.offset, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::listing(
                request.offset,
                ListingFailure::Status(status),
            ));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| AppError::listing(request.offset, e))?;
        let page =
            ListingPage::from_slice(&body).map_err(|e| AppError::listing(request.offset, e))?;

        log::debug!(
            "Listing page {} returned {} items",
            request.index,
            page.subjects.len()
        );
        Ok(page.subjects)
    }
}
