//! Pagers: strategies producing the ordered sequence of page URLs
//!
//! A pager is configured once (options first, then the thread URL) and then
//! driven by repeated [`Pager::next_url`] calls until it returns `Ok(None)`.
//! After that every further call returns `Ok(None)` again.
//!
//! Available pagers:
//! - `vb4`: thread root as page 1, then `/page<N>` suffixes
//! - `query`: rewrites one query parameter per page
//! - `format`: printf-style URL template
//! - `cutter`: replaces a character range of the URL with the page number
//! - `posts`: static thread dumps numbered by post offset

mod cutter;
mod index;
mod posts;
mod query;
mod template;

pub use cutter::CuttingPager;
pub use index::IndexPager;
pub use posts::PostCountPager;
pub use query::QueryPager;
pub use template::{FormatPager, UrlTemplate};

use crate::{ConfigError, ConfigResult, CrawlError};
use url::Url;

pub const PAGER_VB4: &str = "vb4";
pub const PAGER_QUERY: &str = "query";
pub const PAGER_FORMAT: &str = "format";
pub const PAGER_URLCUT: &str = "cutter";
pub const PAGER_POSTS: &str = "posts";

/// Names of all registered pagers
pub const PAGER_NAMES: &[&str] = &[
    PAGER_VB4,
    PAGER_QUERY,
    PAGER_FORMAT,
    PAGER_URLCUT,
    PAGER_POSTS,
];

/// A resumable cursor over the page URLs of a thread
pub trait Pager: Send {
    /// Validates and applies the pager's option tokens
    fn set_options(&mut self, args: &[String]) -> ConfigResult<()>;

    /// Validates and stores the thread address
    fn set_url(&mut self, addr: &str) -> ConfigResult<()>;

    /// Produces the next page URL, or `None` once the pager is exhausted
    fn next_url(&mut self) -> Result<Option<Url>, CrawlError>;

    /// Page number of the URL returned by the latest [`Pager::next_url`]
    fn page_num(&self) -> i64;
}

/// Creates the pager registered under `name`
pub fn new_pager(name: &str) -> ConfigResult<Box<dyn Pager>> {
    let pager: Box<dyn Pager> = match name {
        PAGER_VB4 => Box::<IndexPager>::default(),
        PAGER_QUERY => Box::<QueryPager>::default(),
        PAGER_FORMAT => Box::<FormatPager>::default(),
        PAGER_URLCUT => Box::<CuttingPager>::default(),
        PAGER_POSTS => Box::<PostCountPager>::default(),
        _ => return Err(ConfigError::UnknownPager(name.to_string())),
    };
    Ok(pager)
}

/// Inclusive range of pages to visit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRange {
    pub start: i64,
    pub end: i64,
}

impl PageRange {
    /// Validates `start >= 1` and `end >= start`
    pub fn new(component: &str, start: i64, end: i64) -> ConfigResult<Self> {
        if start < 1 {
            return Err(ConfigError::options(
                component,
                format!("start page must be at least 1, got {}", start),
            ));
        }
        if end < start {
            return Err(ConfigError::options(
                component,
                format!("end page ({}) must not be smaller than start page ({})", end, start),
            ));
        }
        Ok(Self { start, end })
    }

    /// Number of pages in the range
    pub fn len(&self) -> i64 {
        self.end - self.start + 1
    }
}

/// Page bounds shared by all pagers
#[derive(Debug, Clone, clap::Args)]
pub struct PageRangeArgs {
    /// First page to crawl
    #[arg(long)]
    pub start: i64,

    /// Last page to crawl (inclusive)
    #[arg(long)]
    pub end: i64,
}

impl PageRangeArgs {
    pub fn range(&self, component: &str) -> ConfigResult<PageRange> {
        PageRange::new(component, self.start, self.end)
    }
}

/// Standard validation of a thread address: absolute `http`/`https` URL
pub fn url_for_pager(addr: &str) -> ConfigResult<Url> {
    let url = Url::parse(addr).map_err(|e| ConfigError::InvalidUrl(format!("{:?}: {}", addr, e)))?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "{:?} is an unsupported url scheme",
            addr
        )));
    }
    if url.host_str().is_none() {
        return Err(ConfigError::InvalidUrl(format!(
            "{:?} is not an absolute URL",
            addr
        )));
    }
    Ok(url)
}

fn not_configured(component: &str) -> CrawlError {
    CrawlError::Pager(format!("{} pager used before it was configured", component))
}

fn parse_generated(raw: &str) -> Result<Url, CrawlError> {
    Url::parse(raw).map_err(|e| CrawlError::Pager(format!("generated URL {:?}: {}", raw, e)))
}

#[cfg(test)]
pub(crate) mod testing {
    use super::Pager;

    pub fn args(s: &str) -> Vec<String> {
        s.split_whitespace().map(String::from).collect()
    }

    /// Runs `pager` to exhaustion, returning each URL with its page number
    pub fn drain(pager: &mut dyn Pager) -> Vec<(String, i64)> {
        let mut pages = Vec::new();
        while let Some(url) = pager.next_url().unwrap() {
            pages.push((url.to_string(), pager.page_num()));
            assert!(pages.len() <= 10_000, "pager does not terminate");
        }
        for _ in 0..3 {
            assert!(pager.next_url().unwrap().is_none());
        }
        pages
    }

    /// Checks count and numbering of a drained pager against `[start, end]`
    pub fn assert_numbering(pages: &[(String, i64)], start: i64, end: i64, adjust: i64) {
        assert_eq!(pages.len() as i64, end - start + 1);
        for (k, (_, num)) in pages.iter().enumerate() {
            assert_eq!(*num, start + k as i64 + adjust);
        }
    }
}
