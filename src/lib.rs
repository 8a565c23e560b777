//! bbcrawl: a paginated forum thread crawler
//!
//! This crate walks the pages of a forum thread (or any paginated resource)
//! and downloads the media and files linked from every page. A crawl is
//! assembled from three pieces:
//!
//! - a [`pager::Pager`] producing the ordered sequence of page URLs,
//! - a [`crawler::Crawler`] turning one fetched page into download jobs,
//! - a [`download::DownloadDispatcher`] executing those jobs under a
//!   concurrency cap and reporting their outcomes.

pub mod cli;
pub mod config;
pub mod cookies;
pub mod crawler;
pub mod download;
pub mod html;
pub mod pager;
pub mod report;

use thiserror::Error;

/// Main error type for crawl operations
///
/// Only errors on the sequential path (configuration, page fetch, page
/// decoding) surface here. Errors of individual download jobs are reported
/// through [`report::Reporter`] and never abort a crawl.
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("HTTP status {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("No Content-Type found in HTTP response from {url}")]
    MissingContentType { url: String },

    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("Pager error: {0}")]
    Pager(String),

    #[error("Download collector failed: {0}")]
    Collector(#[from] tokio::task::JoinError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
///
/// These are raised while options, URLs or files are validated, always
/// before the first network request of a crawl.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("{component} options: {message}")]
    Options { component: String, message: String },

    #[error("Pager not found: {0:?}")]
    UnknownPager(String),

    #[error("Crawler not found: {0:?}")]
    UnknownCrawler(String),

    #[error("Command line: {0}")]
    CommandLine(String),

    #[error("Cookie file {path}, line {line}: {message}")]
    CookieFile {
        path: String,
        line: usize,
        message: String,
    },
}

impl ConfigError {
    /// Builds an [`ConfigError::Options`] for the named pager or crawler
    pub fn options(component: &str, message: impl ToString) -> Self {
        Self::Options {
            component: component.to_string(),
            message: message.to_string(),
        }
    }
}

/// Result type alias for crawl operations
pub type Result<T> = std::result::Result<T, CrawlError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::{CrawlSettings, Settings};
pub use crawler::{crawl, CrawlContext, CrawlSummary, Crawler};
pub use download::{Download, DownloadDispatcher, DownloadError};
pub use pager::Pager;
