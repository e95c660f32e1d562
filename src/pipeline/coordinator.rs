// src/pipeline/coordinator.rs

//! Three-stage cover pipeline: fetch pages → download covers → save covers.
//!
//! ```text
//!  pages ──► [fetch pool] ──items──► relay ──► [download tasks] ──artifacts──► relay ──► [save tasks]
//! ```
//!
//! Each queue closes when the stage feeding it is quiescent, which ends the
//! relay draining it, which in turn lets the next stage close.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::Utc;
use futures::future;
use futures::stream::{self, StreamExt};
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

use crate::error::{AppError, Result};
use crate::models::{Artifact, ItemRecord, PageRequest, PipelineConfig};
use crate::services::{ArtifactDownloader, PageFetcher};
use crate::storage::ArtifactStore;

use super::queue::{QueueReader, QueueWriter, StageQueue, stage_queue};
use super::stage::StageTracker;
use super::summary::{RunSummary, Stage};

/// Per-stage parallelism ceilings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageLimits {
    pub max_fetch: usize,
    pub max_download: usize,
    pub max_save: usize,
}

impl Default for StageLimits {
    fn default() -> Self {
        Self::from(&PipelineConfig::default())
    }
}

impl From<&PipelineConfig> for StageLimits {
    fn from(config: &PipelineConfig) -> Self {
        Self {
            max_fetch: config.max_fetch_concurrency,
            max_download: config.max_download_concurrency,
            max_save: config.max_save_concurrency,
        }
    }
}

/// How the fetch stage retries a failed listing page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Extra attempts after the first
    pub retries: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            retries: 0,
            delay: Duration::ZERO,
        }
    }
}

/// Coordinates the fetch, download and save stages of one run.
pub struct Pipeline {
    fetcher: Arc<dyn PageFetcher>,
    downloader: Arc<dyn ArtifactDownloader>,
    store: Arc<dyn ArtifactStore>,
    limits: StageLimits,
    retry: RetryPolicy,
    cancel: CancellationToken,
}

impl Pipeline {
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        downloader: Arc<dyn ArtifactDownloader>,
        store: Arc<dyn ArtifactStore>,
    ) -> Self {
        Self {
            fetcher,
            downloader,
            store,
            limits: StageLimits::default(),
            retry: RetryPolicy::none(),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_limits(mut self, limits: StageLimits) -> Self {
        self.limits = StageLimits {
            max_fetch: limits.max_fetch.max(1),
            max_download: limits.max_download.max(1),
            max_save: limits.max_save.max(1),
        };
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Stop dispatching new work once `cancel` fires.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Fetch `total_pages` pages of `page_size` items and save every cover
    /// under `destination_dir`.
    ///
    /// Individual page, download and save failures are recorded in the
    /// returned summary. The run itself fails only when nothing can
    /// progress: no pages requested, no usable destination, every page
    /// failed, or a cancellation that left work undone. A cancellation that
    /// arrives after every stage has drained still returns `Ok`.
    pub async fn run(
        &self,
        total_pages: u32,
        page_size: u32,
        destination_dir: &Path,
    ) -> Result<RunSummary> {
        if total_pages == 0 {
            return Err(AppError::config("total_pages must be > 0"));
        }
        if page_size == 0 {
            return Err(AppError::config("page_size must be > 0"));
        }

        let started_at = Utc::now();
        self.store.prepare(destination_dir).await?;

        log::info!(
            "Starting run: {} pages x {} items into {}",
            total_pages,
            page_size,
            destination_dir.display()
        );

        let (items, item_reader) = stage_queue::<ItemRecord>(Stage::Fetch);
        let (artifacts, artifact_reader) = stage_queue::<Artifact>(Stage::Download);
        let saves = Arc::new(StageTracker::new(Stage::Save));
        let retry_cut_short = AtomicBool::new(false);

        let (fetch, download, ()) = tokio::join!(
            self.fetch_stage(total_pages, page_size, items, &retry_cut_short),
            self.download_relay(item_reader, artifacts),
            self.save_relay(artifact_reader, &saves, destination_dir.to_path_buf()),
        );

        let summary = RunSummary {
            started_at,
            finished_at: Utc::now(),
            pages_requested: total_pages,
            fetch: fetch.report(),
            download: download.report(),
            save: saves.report(),
        };

        log::info!("Run finished: {summary}");

        let interrupted = summary.skipped() > 0 || retry_cut_short.load(Ordering::Relaxed);
        if self.cancel.is_cancelled() && interrupted {
            return Err(AppError::Cancelled(Box::new(summary)));
        }
        if summary.fetch.attempted > 0 && summary.fetch.succeeded == 0 {
            return Err(AppError::ListingUnreachable(Box::new(summary)));
        }
        Ok(summary)
    }

    /// Dispatch one fetch task per page, at most `max_fetch` at a time, then
    /// close the item queue.
    async fn fetch_stage(
        &self,
        total_pages: u32,
        page_size: u32,
        items: StageQueue<ItemRecord>,
        retry_cut_short: &AtomicBool,
    ) -> Arc<StageTracker> {
        let bound = self.limits.max_fetch.min(total_pages as usize).max(1);
        let mut dispatched = 0usize;

        stream::iter(0..total_pages)
            .take_while(|_| future::ready(!self.cancel.is_cancelled()))
            .map(|index| {
                dispatched += 1;
                (PageRequest::new(index, page_size), items.writer())
            })
            .for_each_concurrent(bound, |(request, writer)| {
                self.fetch_page(request, writer, retry_cut_short)
            })
            .await;

        let undispatched = total_pages as usize - dispatched;
        if undispatched > 0 {
            log::info!("Cancelled: {undispatched} pages not requested");
            items.skip(undispatched);
        }

        items.close().await
    }

    async fn fetch_page(
        &self,
        request: PageRequest,
        writer: QueueWriter<ItemRecord>,
        retry_cut_short: &AtomicBool,
    ) {
        match self.fetch_with_retry(request, retry_cut_short).await {
            Ok(records) => {
                log::debug!("Page {} yielded {} items", request.index, records.len());
                for record in records {
                    writer.send(record);
                }
                writer.succeed();
            }
            Err(e) => {
                log::warn!("Failed to fetch page {}: {}", request.index, e);
                writer.fail(format!("page {}", request.index), e);
            }
        }
    }

    /// Sets `cut_short` when cancellation abandons a pending retry.
    async fn fetch_with_retry(
        &self,
        request: PageRequest,
        cut_short: &AtomicBool,
    ) -> Result<Vec<ItemRecord>> {
        let mut attempt = 0;
        loop {
            match self.fetcher.fetch(request).await {
                Ok(records) => return Ok(records),
                Err(e) if e.is_retryable() && attempt < self.retry.retries => {
                    attempt += 1;
                    log::debug!(
                        "Retrying page {} ({}/{}): {}",
                        request.index,
                        attempt,
                        self.retry.retries,
                        e
                    );
                    tokio::select! {
                        _ = self.cancel.cancelled() => {
                            cut_short.store(true, Ordering::Relaxed);
                            return Err(e);
                        }
                        _ = tokio::time::sleep(self.retry.delay) => {}
                    }
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Drain the item queue, spawning one download per item behind a
    /// semaphore, then close the artifact queue.
    async fn download_relay(
        &self,
        mut items: QueueReader<ItemRecord>,
        artifacts: StageQueue<Artifact>,
    ) -> Arc<StageTracker> {
        let slots = Arc::new(Semaphore::new(self.limits.max_download));

        while let Some(item) = items.recv().await {
            let Some(permit) = self.acquire(&slots).await else {
                artifacts.skip(1);
                continue;
            };

            let writer = artifacts.writer();
            let downloader = Arc::clone(&self.downloader);
            tokio::spawn(async move {
                let _permit = permit;
                match downloader.download(&item).await {
                    Ok(artifact) => {
                        writer.send(artifact);
                        writer.succeed();
                    }
                    Err(e) => {
                        log::warn!("Failed to download cover {} ({}): {}", item.id, item.title, e);
                        writer.fail(item.id, e);
                    }
                }
            });
        }

        artifacts.close().await
    }

    /// Drain the artifact queue, spawning one save per artifact behind a
    /// semaphore, and return once every save has finished.
    async fn save_relay(
        &self,
        mut artifacts: QueueReader<Artifact>,
        saves: &Arc<StageTracker>,
        destination_dir: PathBuf,
    ) {
        let slots = Arc::new(Semaphore::new(self.limits.max_save));
        let destination_dir = Arc::new(destination_dir);

        while let Some(artifact) = artifacts.recv().await {
            let Some(permit) = self.acquire(&slots).await else {
                saves.record_skipped(1);
                continue;
            };

            let ticket = saves.register();
            let store = Arc::clone(&self.store);
            let destination_dir = Arc::clone(&destination_dir);
            tokio::spawn(async move {
                let _permit = permit;
                match store
                    .save(&artifact.key, &artifact.payload, &destination_dir)
                    .await
                {
                    Ok(path) => {
                        log::info!("{}", path.display());
                        ticket.succeed();
                    }
                    Err(e) => {
                        log::warn!("Failed to save cover {}: {}", artifact.key, e);
                        ticket.fail(artifact.key, e);
                    }
                }
            });
        }

        saves.seal();
        saves.wait_quiescent().await;
    }

    /// A concurrency slot, or `None` once the run is cancelled.
    async fn acquire(&self, slots: &Arc<Semaphore>) -> Option<tokio::sync::OwnedSemaphorePermit> {
        if self.cancel.is_cancelled() {
            return None;
        }
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => None,
            permit = Arc::clone(slots).acquire_owned() => permit.ok(),
        }
    }
}
