//! Application configuration structures.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Listing API and HTTP client settings
    #[serde(default)]
    pub listing: ListingConfig,

    /// Page counts and per-stage concurrency bounds
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Where covers are written
    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.listing.user_agent.trim().is_empty() {
            return Err(AppError::validation("listing.user_agent is empty"));
        }
        if self.listing.timeout_secs == 0 {
            return Err(AppError::validation("listing.timeout_secs must be > 0"));
        }
        url::Url::parse(&self.listing.endpoint)
            .map_err(|e| AppError::validation(format!("listing.endpoint is invalid: {e}")))?;
        if self.pipeline.total_pages == 0 {
            return Err(AppError::validation("pipeline.total_pages must be > 0"));
        }
        if self.pipeline.page_size == 0 {
            return Err(AppError::validation("pipeline.page_size must be > 0"));
        }
        if self.pipeline.max_fetch_concurrency == 0
            || self.pipeline.max_download_concurrency == 0
            || self.pipeline.max_save_concurrency == 0
        {
            return Err(AppError::validation(
                "pipeline concurrency limits must be > 0",
            ));
        }
        if self.output.extension.is_empty() || self.output.extension.contains(['/', '\\', '.']) {
            return Err(AppError::validation(
                "output.extension must be a bare extension such as \"jpg\"",
            ));
        }
        Ok(())
    }
}

/// Listing endpoint and HTTP client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingConfig {
    /// Listing endpoint URL
    #[serde(default = "defaults::endpoint")]
    pub endpoint: String,

    /// Value of the `type` query parameter
    #[serde(default = "defaults::media_type")]
    pub media_type: String,

    /// Value of the `tag` query parameter
    #[serde(default = "defaults::tag")]
    pub tag: String,

    /// Value of the `sort` query parameter
    #[serde(default = "defaults::sort")]
    pub sort: String,

    /// User-Agent header for every request
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Extra attempts for a page after a transient failure
    #[serde(default = "defaults::retries")]
    pub retries: u32,

    /// Pause between attempts in milliseconds
    #[serde(default = "defaults::retry_delay")]
    pub retry_delay_ms: u64,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            endpoint: defaults::endpoint(),
            media_type: defaults::media_type(),
            tag: defaults::tag(),
            sort: defaults::sort(),
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            retries: defaults::retries(),
            retry_delay_ms: defaults::retry_delay(),
        }
    }
}

/// Run size and concurrency bounds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Number of listing pages to fetch
    #[serde(default = "defaults::total_pages")]
    pub total_pages: u32,

    /// Items requested per page
    #[serde(default = "defaults::page_size")]
    pub page_size: u32,

    #[serde(default = "defaults::max_fetch_concurrency")]
    pub max_fetch_concurrency: usize,

    #[serde(default = "defaults::max_download_concurrency")]
    pub max_download_concurrency: usize,

    #[serde(default = "defaults::max_save_concurrency")]
    pub max_save_concurrency: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            total_pages: defaults::total_pages(),
            page_size: defaults::page_size(),
            max_fetch_concurrency: defaults::max_fetch_concurrency(),
            max_download_concurrency: defaults::max_download_concurrency(),
            max_save_concurrency: defaults::max_save_concurrency(),
        }
    }
}

/// Output location settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Root directory for saved covers
    #[serde(default = "defaults::destination_dir")]
    pub destination_dir: PathBuf,

    /// File extension appended to every cover
    #[serde(default = "defaults::extension")]
    pub extension: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            destination_dir: defaults::destination_dir(),
            extension: defaults::extension(),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset
    #[serde(default = "defaults::log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::log_level(),
        }
    }
}

mod defaults {
    use std::path::PathBuf;

    // Listing defaults
    pub fn endpoint() -> String {
        "https://movie.douban.com/j/search_subjects".into()
    }
    pub fn media_type() -> String {
        "movie".into()
    }
    pub fn tag() -> String {
        "热门".into()
    }
    pub fn sort() -> String {
        "recommend".into()
    }
    pub fn user_agent() -> String {
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:71.0) Gecko/20100101 Firefox/71.0".into()
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn retries() -> u32 {
        1
    }
    pub fn retry_delay() -> u64 {
        500
    }

    // Pipeline defaults
    pub fn total_pages() -> u32 {
        20
    }
    pub fn page_size() -> u32 {
        20
    }
    pub fn max_fetch_concurrency() -> usize {
        4
    }
    pub fn max_download_concurrency() -> usize {
        8
    }
    pub fn max_save_concurrency() -> usize {
        4
    }

    // Output defaults
    pub fn destination_dir() -> PathBuf {
        PathBuf::from("douban/covers")
    }
    pub fn extension() -> String {
        "jpg".into()
    }

    pub fn log_level() -> String {
        "info".into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_default_destination_matches_sample_config() {
        let sample: Config = toml::from_str(include_str!("../../config.toml")).unwrap();
        assert_eq!(Config::default().output.destination_dir, PathBuf::from("douban/covers"));
        assert_eq!(
            sample.output.destination_dir,
            Config::default().output.destination_dir
        );
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            [pipeline]
            total_pages = 3

            [output]
            destination_dir = "out/covers"
            "#,
        )
        .unwrap();

        assert_eq!(config.pipeline.total_pages, 3);
        assert_eq!(config.pipeline.page_size, 20);
        assert_eq!(config.output.destination_dir, PathBuf::from("out/covers"));
        assert_eq!(config.output.extension, "jpg");
        assert_eq!(config.listing.media_type, "movie");
    }

    #[test]
    fn test_validate_rejects_zero_bounds() {
        let mut config = Config::default();
        config.pipeline.max_download_concurrency = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_endpoint() {
        let mut config = Config::default();
        config.listing.endpoint = "not a url".into();
        assert!(matches!(config.validate(), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_validate_rejects_dotted_extension() {
        let mut config = Config::default();
        config.output.extension = ".jpg".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let config = Config::load_or_default("/nonexistent/config.toml");
        assert_eq!(config.pipeline.total_pages, 20);
    }
}
