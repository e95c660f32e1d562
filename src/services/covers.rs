// src/services/covers.rs

//! Cover image downloader.

use async_trait::async_trait;
use reqwest::Client;

use crate::error::{AppError, Result};
use crate::models::{Artifact, ItemRecord};
use crate::utils::sanitize;

use super::ArtifactDownloader;

/// Downloads covers with a shared HTTP client.
#[derive(Clone)]
pub struct HttpArtifactDownloader {
    client: Client,
}

impl HttpArtifactDownloader {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    async fn fetch_bytes(&self, url: &str) -> reqwest::Result<Vec<u8>> {
        // The response is either fully read or dropped here, which returns
        // the connection to the pool on every path.
        let response = self.client.get(url).send().await?.error_for_status()?;
        Ok(response.bytes().await?.to_vec())
    }
}

#[async_trait]
impl ArtifactDownloader for HttpArtifactDownloader {
    async fn download(&self, item: &ItemRecord) -> Result<Artifact> {
        let payload = self
            .fetch_bytes(&item.cover_url)
            .await
            .map_err(|source| AppError::ArtifactFetchFailed {
                id: item.id.clone(),
                title: item.title.clone(),
                source,
            })?;

        log::debug!("Downloaded cover for {} ({} bytes)", item.id, payload.len());

        Ok(Artifact {
            key: sanitize(&item.title),
            item_id: item.id.clone(),
            payload,
        })
    }
}
