use super::{not_configured, url_for_pager, PageRange, PageRangeArgs, Pager, PAGER_QUERY};
use crate::cli::parse_options;
use crate::{ConfigError, ConfigResult, CrawlError};
use url::Url;

#[derive(Debug, clap::Parser)]
struct QueryOptions {
    #[command(flatten)]
    range: PageRangeArgs,

    /// Query parameter carrying the page number
    #[arg(long, default_value = "page")]
    name: String,
}

/// Paging through a query parameter: `thread?page=1`, `thread?page=2`, ...
///
/// The other parameters of the thread URL are kept in their original order.
/// The page parameter keeps the position of its first occurrence, or is
/// appended if the thread URL does not carry it.
#[derive(Debug, Default)]
pub struct QueryPager {
    range: Option<PageRange>,
    key: String,
    thread: Option<Url>,
    pairs: Vec<(String, String)>,
    value: i64,
}

impl QueryPager {
    fn page_pairs(&self, value: i64) -> Vec<(String, String)> {
        let value = value.to_string();
        let mut pairs = Vec::with_capacity(self.pairs.len() + 1);
        let mut placed = false;
        for (key, val) in &self.pairs {
            if *key != self.key {
                pairs.push((key.clone(), val.clone()));
            } else if !placed {
                pairs.push((key.clone(), value.clone()));
                placed = true;
            }
        }
        if !placed {
            pairs.push((self.key.clone(), value));
        }
        pairs
    }
}

impl Pager for QueryPager {
    fn set_options(&mut self, args: &[String]) -> ConfigResult<()> {
        let options: QueryOptions = parse_options(PAGER_QUERY, args)?;
        let range = options.range.range(PAGER_QUERY)?;
        if options.name.is_empty() {
            return Err(ConfigError::options(PAGER_QUERY, "page identifier not set"));
        }
        self.range = Some(range);
        self.key = options.name;
        self.value = range.start;
        Ok(())
    }

    fn set_url(&mut self, addr: &str) -> ConfigResult<()> {
        let mut thread = url_for_pager(addr)?;
        self.pairs = thread.query_pairs().into_owned().collect();
        thread.set_query(None);
        self.thread = Some(thread);
        Ok(())
    }

    fn next_url(&mut self) -> Result<Option<Url>, CrawlError> {
        let (Some(range), Some(thread)) = (self.range, self.thread.as_ref()) else {
            return Err(not_configured(PAGER_QUERY));
        };
        if self.value > range.end {
            return Ok(None);
        }

        let mut url = thread.clone();
        url.query_pairs_mut().extend_pairs(self.page_pairs(self.value));
        self.value += 1;
        Ok(Some(url))
    }

    fn page_num(&self) -> i64 {
        self.value - 1
    }
}
