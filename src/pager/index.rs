use super::{
    not_configured, parse_generated, url_for_pager, PageRange, PageRangeArgs, Pager, PAGER_VB4,
};
use crate::cli::parse_options;
use crate::{ConfigResult, CrawlError};
use url::Url;

#[derive(Debug, clap::Parser)]
struct IndexOptions {
    #[command(flatten)]
    range: PageRangeArgs,
}

/// vBulletin 4 style paging: `thread`, `thread/page2`, `thread/page3`, ...
#[derive(Debug, Default)]
pub struct IndexPager {
    range: Option<PageRange>,
    thread: Option<Url>,
    page: i64,
}

impl Pager for IndexPager {
    fn set_options(&mut self, args: &[String]) -> ConfigResult<()> {
        let options: IndexOptions = parse_options(PAGER_VB4, args)?;
        self.range = Some(options.range.range(PAGER_VB4)?);
        Ok(())
    }

    fn set_url(&mut self, addr: &str) -> ConfigResult<()> {
        self.thread = Some(url_for_pager(addr)?);
        Ok(())
    }

    fn next_url(&mut self) -> Result<Option<Url>, CrawlError> {
        let (Some(range), Some(thread)) = (self.range, self.thread.as_ref()) else {
            return Err(not_configured(PAGER_VB4));
        };

        if self.page < range.start {
            self.page = range.start;
        }
        if self.page > range.end {
            return Ok(None);
        }

        let page = self.page;
        self.page += 1;
        if page == 1 {
            return Ok(Some(thread.clone()));
        }

        let root = thread.as_str();
        let addr = if root.ends_with('/') {
            format!("{}page{}", root, page)
        } else {
            format!("{}/page{}", root, page)
        };
        parse_generated(&addr).map(Some)
    }

    fn page_num(&self) -> i64 {
        self.page - 1
    }
}
