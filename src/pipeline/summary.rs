// src/pipeline/summary.rs

//! Per-run and per-stage statistics.

use std::fmt;

use chrono::{DateTime, Utc};

use crate::error::AppError;

/// A pipeline phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Fetch,
    Download,
    Save,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Fetch => "fetch",
            Stage::Download => "download",
            Stage::Save => "save",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// One recovered task failure.
#[derive(Debug)]
pub struct StageFailure {
    /// What the task was working on (page number, item id, save key)
    pub subject: String,
    pub error: AppError,
}

/// Outcome counters for one stage.
#[derive(Debug)]
pub struct StageReport {
    pub stage: Stage,
    /// Tasks dispatched
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Work that reached the stage but was not dispatched because the run
    /// was cancelled
    pub skipped: usize,
    /// Values pushed onto the stage's output queue
    pub emitted: usize,
    pub failures: Vec<StageFailure>,
}

impl StageReport {
    pub fn empty(stage: Stage) -> Self {
        Self {
            stage,
            attempted: 0,
            succeeded: 0,
            failed: 0,
            skipped: 0,
            emitted: 0,
            failures: Vec::new(),
        }
    }
}

/// Result of a pipeline run.
#[derive(Debug)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub pages_requested: u32,
    pub fetch: StageReport,
    pub download: StageReport,
    pub save: StageReport,
}

impl RunSummary {
    /// An empty summary for a run that has just started.
    pub fn new(pages_requested: u32) -> Self {
        let now = Utc::now();
        Self {
            started_at: now,
            finished_at: now,
            pages_requested,
            fetch: StageReport::empty(Stage::Fetch),
            download: StageReport::empty(Stage::Download),
            save: StageReport::empty(Stage::Save),
        }
    }

    /// Items emitted by the listing pages.
    pub fn items_fetched(&self) -> usize {
        self.fetch.emitted
    }

    /// Covers written to disk.
    pub fn saved(&self) -> usize {
        self.save.succeeded
    }

    /// Failures across all stages.
    pub fn failed(&self) -> usize {
        self.stages().iter().map(|s| s.failed).sum()
    }

    pub fn skipped(&self) -> usize {
        self.stages().iter().map(|s| s.skipped).sum()
    }

    /// True when every dispatched task succeeded and nothing was skipped.
    pub fn is_clean(&self) -> bool {
        self.failed() == 0 && self.skipped() == 0
    }

    pub fn elapsed(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }

    pub fn stages(&self) -> [&StageReport; 3] {
        [&self.fetch, &self.download, &self.save]
    }

    /// All recorded failures, tagged with their stage.
    pub fn failures(&self) -> impl Iterator<Item = (Stage, &StageFailure)> {
        self.stages()
            .into_iter()
            .flat_map(|report| report.failures.iter().map(move |f| (report.stage, f)))
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "fetched={} saved={} failed={} skipped={} in {:.1}s",
            self.items_fetched(),
            self.saved(),
            self.failed(),
            self.skipped(),
            self.elapsed().num_milliseconds() as f64 / 1000.0
        )
    }
}
