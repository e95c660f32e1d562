//! Pipeline entry points for cover crawling.
//!
//! - `run_crawler`: fetch the listing and save every cover
//! - [`Pipeline`]: the stage coordinator, usable with any fetcher,
//!   downloader and store

mod coordinator;
pub mod crawl;
pub mod queue;
pub mod stage;
mod summary;


pub use coordinator::{Pipeline, RetryPolicy, StageLimits};
pub use crawl::run_crawler;
pub use stage::{StageState, StageTracker, TaskTicket};
pub use summary::{RunSummary, Stage, StageFailure, StageReport};
