// src/error.rs

//! Unified error handling for the cover crawler.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::pipeline::{RunSummary, Stage};

/// Result type alias for crawler operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// TOML serialization failed
    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// A listing page could not be fetched or decoded.
    #[error("Listing fetch failed at offset {offset}: {cause}")]
    ListingFetchFailed {
        offset: u32,
        #[source]
        cause: ListingFailure,
    },

    /// A cover image could not be downloaded.
    #[error("Cover download failed for {id} ({title}): {source}")]
    ArtifactFetchFailed {
        id: String,
        title: String,
        #[source]
        source: reqwest::Error,
    },

    /// A cover image could not be written to disk.
    #[error("Failed to write {}: {source}", .path.display())]
    StoreWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The output directory could not be created.
    #[error("Destination {} is unavailable: {source}", .path.display())]
    DestinationUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A task finished without settling its outcome (e.g. it panicked).
    #[error("{0} task ended without reporting an outcome")]
    TaskAborted(Stage),

    /// Every listing page failed, so the run could not make progress.
    #[error("Listing endpoint unreachable: all {} pages failed", .0.fetch.attempted)]
    ListingUnreachable(Box<RunSummary>),

    /// The run was stopped by a cancellation signal.
    #[error("Run cancelled after saving {} covers", .0.saved())]
    Cancelled(Box<RunSummary>),
}

impl AppError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a listing error for the page at `offset`.
    pub fn listing(offset: u32, cause: impl Into<ListingFailure>) -> Self {
        Self::ListingFetchFailed {
            offset,
            cause: cause.into(),
        }
    }

    /// Whether repeating the failed operation may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::ListingFetchFailed { cause, .. } => cause.is_retryable(),
            Self::Http(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }

    /// The partial run summary carried by run-level failures.
    pub fn summary(&self) -> Option<&RunSummary> {
        match self {
            Self::ListingUnreachable(summary) | Self::Cancelled(summary) => Some(summary),
            _ => None,
        }
    }
}

/// Why a listing request failed.
#[derive(Debug)]
pub enum ListingFailure {
    /// The request never produced a response (connect, timeout, body read).
    Transport(reqwest::Error),
    /// The server answered with a non-success status.
    Status(reqwest::StatusCode),
    /// The body was not the expected JSON document.
    Decode(serde_json::Error),
}

impl ListingFailure {
    /// Transport errors and server-side statuses may be transient; a body
    /// that does not decode means the contract changed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Status(status) => {
                status.is_server_error() || *status == reqwest::StatusCode::TOO_MANY_REQUESTS
            }
            Self::Decode(_) => false,
        }
    }
}

impl fmt::Display for ListingFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(e) => write!(f, "transport error: {e}"),
            Self::Status(status) => write!(f, "unexpected status {status}"),
            Self::Decode(e) => write!(f, "malformed response: {e}"),
        }
    }
}

impl std::error::Error for ListingFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Transport(e) => Some(e),
            Self::Status(_) => None,
            Self::Decode(e) => Some(e),
        }
    }
}

impl From<reqwest::Error> for ListingFailure {
    fn from(e: reqwest::Error) -> Self {
        Self::Transport(e)
    }
}

impl From<serde_json::Error> for ListingFailure {
    fn from(e: serde_json::Error) -> Self {
        Self::Decode(e)
    }
}
