//! Crawlers: strategies turning one fetched page into download jobs
//!
//! This module contains:
//! - The [`Crawler`] contract and the name → crawler registry
//! - Page fetching with the crawl's client, cookie jar and redirect policy
//! - The crawler variants (`file`, `img`, `vb-attachments`, `src`)
//! - The orchestrator driving pager and crawler

mod attachments;
mod fetcher;
mod file;
mod img;
mod media;
mod options;
mod orchestrator;
mod redirect;

pub use attachments::AttachmentCrawler;
pub use fetcher::{resolve_link, PageFetcher};
pub use file::FileCrawler;
pub use img::ImgCrawler;
pub use media::{MediaTag, SrcCrawler};
pub use options::{parse_attrs, AttrFilter, CommonArgs};
pub use orchestrator::{crawl, CrawlContext, CrawlSummary};
pub use redirect::{RedirectPolicy, MAX_REDIRECTS};

use crate::config::Settings;
use crate::download::DownloadDispatcher;
use crate::{ConfigError, ConfigResult, CrawlError};
use async_trait::async_trait;
use url::Url;

pub const CRAWLER_FILE: &str = "file";
pub const CRAWLER_IMG: &str = "img";
pub const CRAWLER_VB_ATTACHMENTS: &str = "vb-attachments";
pub const CRAWLER_SRC: &str = "src";

/// Names of all registered crawlers
pub const CRAWLER_NAMES: &[&str] =
    &[CRAWLER_FILE, CRAWLER_IMG, CRAWLER_VB_ATTACHMENTS, CRAWLER_SRC];

/// A page handed to a crawler
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub url: Url,
    /// Page number reported by the pager, used for file naming
    pub number: i64,
}

/// Turns pages into download jobs
#[async_trait]
pub trait Crawler: Send {
    /// Validates and applies the crawler's option tokens
    fn set_options(&mut self, args: &[String]) -> ConfigResult<()>;

    /// Fetches `page` once and dispatches its downloads
    ///
    /// Returns once every download of the page has been admitted. An error
    /// aborts the whole crawl; problems with single links are logged and
    /// skipped.
    async fn crawl(
        &mut self,
        page: &Page,
        dispatcher: &mut DownloadDispatcher,
    ) -> Result<(), CrawlError>;
}

/// Creates the crawler registered under `name`
pub fn new_crawler(name: &str, settings: Settings) -> ConfigResult<Box<dyn Crawler>> {
    let crawler: Box<dyn Crawler> = match name {
        CRAWLER_FILE => Box::new(FileCrawler::new(settings)),
        CRAWLER_IMG => Box::new(ImgCrawler::new(settings)),
        CRAWLER_VB_ATTACHMENTS => Box::new(AttachmentCrawler::new(settings)),
        CRAWLER_SRC => Box::new(SrcCrawler::new(settings)),
        _ => return Err(ConfigError::UnknownCrawler(name.to_string())),
    };
    Ok(crawler)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CrawlSettings;
    use std::sync::Arc;

    #[test]
    fn test_registry() {
        let settings = Arc::new(CrawlSettings::new("/tmp"));
        for name in CRAWLER_NAMES {
            assert!(new_crawler(name, settings.clone()).is_ok(), "{} not registered", name);
        }
        assert!(matches!(
            new_crawler("images", settings),
            Err(ConfigError::UnknownCrawler(ref name)) if name == "images"
        ));
    }
}
