use super::{
    not_configured, parse_generated, url_for_pager, PageRange, PageRangeArgs, Pager, PAGER_POSTS,
};
use crate::cli::parse_options;
use crate::{ConfigError, ConfigResult, CrawlError};
use url::Url;

const SUFFIX: &str = ".html";

#[derive(Debug, clap::Parser)]
struct PostsOptions {
    #[command(flatten)]
    range: PageRangeArgs,

    /// Number of posts shown on one page
    #[arg(long)]
    posts: i64,
}

/// Paging through a thread stored as static files numbered by post offset:
/// `thread.html`, `thread-20.html`, `thread-40.html`, ...
#[derive(Debug, Default)]
pub struct PostCountPager {
    range: Option<PageRange>,
    posts: i64,
    thread: Option<Url>,
    page: i64,
}

impl Pager for PostCountPager {
    fn set_options(&mut self, args: &[String]) -> ConfigResult<()> {
        let options: PostsOptions = parse_options(PAGER_POSTS, args)?;
        let range = options.range.range(PAGER_POSTS)?;
        if options.posts < 1 {
            return Err(ConfigError::options(
                PAGER_POSTS,
                format!("posts per page must be at least 1, got {}", options.posts),
            ));
        }
        self.range = Some(range);
        self.posts = options.posts;
        self.page = range.start;
        Ok(())
    }

    fn set_url(&mut self, addr: &str) -> ConfigResult<()> {
        let thread = url_for_pager(addr)?;
        if !thread.as_str().contains(SUFFIX) {
            return Err(ConfigError::InvalidUrl(format!(
                "{:?} does not contain {:?}",
                addr, SUFFIX
            )));
        }
        self.thread = Some(thread);
        Ok(())
    }

    fn next_url(&mut self) -> Result<Option<Url>, CrawlError> {
        let (Some(range), Some(thread)) = (self.range, self.thread.as_ref()) else {
            return Err(not_configured(PAGER_POSTS));
        };
        if self.page > range.end {
            return Ok(None);
        }

        let offset = (self.page - 1) * self.posts;
        self.page += 1;
        if offset == 0 {
            return Ok(Some(thread.clone()));
        }

        let root = thread.as_str();
        let Some(pos) = root.rfind(SUFFIX) else {
            return Err(CrawlError::Pager(format!("{:?} lost its {:?} suffix", root, SUFFIX)));
        };
        let addr = format!("{}-{}{}", &root[..pos], offset, &root[pos..]);
        parse_generated(&addr).map(Some)
    }

    fn page_num(&self) -> i64 {
        self.page - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pager::testing::{args, assert_numbering, drain};

    fn pager(opts: &str, addr: &str) -> PostCountPager {
        let mut pager = PostCountPager::default();
        pager.set_options(&args(opts)).unwrap();
        pager.set_url(addr).unwrap();
        pager
    }

    #[test]
    fn test_offsets() {
        let mut pager = pager(
            "--start 1 --end 3 --posts 20",
            "http://archive.example.com/t/123.html",
        );
        assert_eq!(
            drain(&mut pager),
            vec![
                ("http://archive.example.com/t/123.html".to_string(), 1),
                ("http://archive.example.com/t/123-20.html".to_string(), 2),
                ("http://archive.example.com/t/123-40.html".to_string(), 3),
            ]
        );
    }

    #[test]
    fn test_last_suffix_is_rewritten() {
        let mut pager = pager(
            "--start 2 --end 2 --posts 15",
            "http://archive.example.com/a.html/t.html",
        );
        let urls: Vec<String> = drain(&mut pager).into_iter().map(|(u, _)| u).collect();
        assert_eq!(urls, vec!["http://archive.example.com/a.html/t-15.html"]);
    }

    #[test]
    fn test_numbering() {
        for (start, end) in [(1, 1), (1, 10), (5, 6)] {
            let mut pager = pager(
                &format!("--start {} --end {} --posts 10", start, end),
                "http://archive.example.com/t.html",
            );
            assert_numbering(&drain(&mut pager), start, end, 0);
        }
    }

    #[test]
    fn test_invalid_configuration() {
        let mut pager = PostCountPager::default();
        assert!(pager.set_options(&args("--start 1 --end 2")).is_err());
        assert!(pager.set_options(&args("--start 1 --end 2 --posts 0")).is_err());
        assert!(pager.set_url("http://archive.example.com/t.php").is_err());
    }
}
