//! The pager → crawler loop
//!
//! One crawl runs sequentially: ask the pager for the next URL, let the
//! crawler turn that page into downloads, repeat. Only the downloads run
//! concurrently, inside the dispatcher. The first pager or crawler error
//! ends the crawl; download failures never do.

use super::{new_crawler, Crawler, Page};
use crate::config::Settings;
use crate::download::DownloadDispatcher;
use crate::pager::{new_pager, Pager};
use crate::report::{report_completions, LogReporter, Reporter};
use crate::{ConfigResult, CrawlError};
use std::sync::Arc;

/// Everything one crawl run needs
pub struct CrawlContext {
    pub settings: Settings,
    pub pager: Box<dyn Pager>,
    pub crawler: Box<dyn Crawler>,
    pub reporter: Arc<dyn Reporter>,
}

impl CrawlContext {
    /// Looks up the named pager and crawler; outcomes go to a [`LogReporter`]
    pub fn new(pager: &str, crawler: &str, settings: Settings) -> ConfigResult<Self> {
        Ok(Self {
            pager: new_pager(pager)?,
            crawler: new_crawler(crawler, settings.clone())?,
            settings,
            reporter: Arc::new(LogReporter),
        })
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn Reporter>) -> Self {
        self.reporter = reporter;
        self
    }
}

/// Result of a finished crawl
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CrawlSummary {
    /// Pages crawled
    pub pages: usize,
    /// Downloads that completed successfully
    pub succeeded: usize,
    /// Downloads that failed
    pub failed: usize,
}

/// Runs a crawl until the pager is exhausted or an error occurs
///
/// The dispatcher is always drained before this returns: downloads already
/// running when an error stops the crawl still finish and are reported.
pub async fn crawl(ctx: CrawlContext) -> Result<CrawlSummary, CrawlError> {
    let CrawlContext {
        settings,
        mut pager,
        mut crawler,
        reporter,
    } = ctx;

    let (mut dispatcher, completions) = DownloadDispatcher::new(settings.jobs);
    tracing::debug!("Running up to {} downloads at a time", dispatcher.max_jobs());
    let collector = tokio::spawn(report_completions(completions, reporter));

    let outcome = drive(pager.as_mut(), crawler.as_mut(), &mut dispatcher).await;

    dispatcher.close().await;
    let tally = collector.await?;
    let pages = outcome?;

    tracing::info!(
        "Crawl finished: {} pages, {} downloads succeeded, {} failed",
        pages,
        tally.succeeded,
        tally.failed
    );
    Ok(CrawlSummary {
        pages,
        succeeded: tally.succeeded,
        failed: tally.failed,
    })
}

async fn drive(
    pager: &mut dyn Pager,
    crawler: &mut dyn Crawler,
    dispatcher: &mut DownloadDispatcher,
) -> Result<usize, CrawlError> {
    let mut pages = 0;
    while let Some(url) = pager.next_url()? {
        let page = Page {
            url,
            number: pager.page_num(),
        };
        tracing::info!("Crawling page {}: {}", page.number, page.url);
        crawler.crawl(&page, dispatcher).await?;
        pages += 1;
    }
    Ok(pages)
}
