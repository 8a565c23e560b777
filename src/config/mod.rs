//! Configuration module for bbcrawl
//!
//! Global crawl settings come from two layers: an optional TOML file and the
//! command line. Both are merged into a [`CrawlConfig`] and then resolved
//! into validated [`CrawlSettings`] before the crawl starts.
//!
//! # Example
//!
//! ```no_run
//! use bbcrawl::config::{load_config, CrawlSettings};
//! use std::path::Path;
//!
//! let config = load_config(Path::new("bbcrawl.toml")).unwrap();
//! let settings = CrawlSettings::resolve(config.crawl, Path::new("/tmp")).unwrap();
//! println!("Downloading into {}", settings.output.display());
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CrawlConfig, CrawlSettings, DEFAULT_DL_JOBS, DEFAULT_TIMEOUT_SECS, MAX_DL_JOBS,
};

// Re-export parser functions
pub use parser::load_config;

/// Settings alias used by the crawl context
pub type Settings = std::sync::Arc<CrawlSettings>;
