use super::fetcher::{submit, PageFetcher};
use super::options::CommonArgs;
use super::{Crawler, Page, CRAWLER_FILE};
use crate::cli::parse_options;
use crate::config::Settings;
use crate::download::{file_name_from_url, DownloadDispatcher};
use crate::{ConfigResult, CrawlError};
use async_trait::async_trait;

#[derive(Debug, clap::Parser)]
struct FileOptions {
    #[command(flatten)]
    common: CommonArgs,
}

/// Downloads every page itself as a file
///
/// Files are named `<page> - <last path segment>`. If the URL has no last
/// segment the name is taken from the response headers.
pub struct FileCrawler {
    fetcher: PageFetcher,
}

impl FileCrawler {
    pub fn new(settings: Settings) -> Self {
        Self {
            fetcher: PageFetcher::new(settings),
        }
    }
}

#[async_trait]
impl Crawler for FileCrawler {
    fn set_options(&mut self, args: &[String]) -> ConfigResult<()> {
        let options: FileOptions = parse_options(CRAWLER_FILE, args)?;
        self.fetcher.configure(options.common);
        Ok(())
    }

    async fn crawl(
        &mut self,
        page: &Page,
        dispatcher: &mut DownloadDispatcher,
    ) -> Result<(), CrawlError> {
        self.fetcher.client(&page.url)?;

        let name = file_name_from_url(&page.url);
        let name = if name.is_empty() {
            name
        } else {
            format!("{} - {}", page.number, name)
        };
        let job = self
            .fetcher
            .download(&page.url, page.url.clone(), self.fetcher.output(), &name);
        submit(dispatcher, job).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CrawlSettings;
    use std::sync::Arc;
    use tempfile::TempDir;
    use url::Url;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_page_saved_as_file() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/dumps/thread-7.html"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>page</html>"))
            .expect(1)
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let mut crawler = FileCrawler::new(Arc::new(CrawlSettings::new(dir.path())));
        crawler.set_options(&[]).unwrap();

        let (mut dispatcher, completions) = DownloadDispatcher::new(2);
        let page = Page {
            url: Url::parse(&format!("{}/dumps/thread-7.html", server.uri())).unwrap(),
            number: 7,
        };
        crawler.crawl(&page, &mut dispatcher).await.unwrap();
        dispatcher.close().await;

        let done = completions.collect_all().await;
        assert_eq!(done.len(), 1);
        assert!(done[0].is_success(), "{:?}", done[0].error());
        assert_eq!(done[0].file(), "7 - thread-7.html");
        let saved = std::fs::read_to_string(dir.path().join("7 - thread-7.html")).unwrap();
        assert_eq!(saved, "<html>page</html>");
    }

    #[tokio::test]
    async fn test_excluded_page_is_skipped() {
        let dir = TempDir::new().unwrap();
        let mut crawler = FileCrawler::new(Arc::new(CrawlSettings::new(dir.path())));
        crawler
            .set_options(&["--exclude".to_string(), "http://x.net/t.html".to_string()])
            .unwrap();

        let (mut dispatcher, _completions) = DownloadDispatcher::new(1);
        let page = Page {
            url: Url::parse("http://x.net/t.html").unwrap(),
            number: 1,
        };
        crawler.crawl(&page, &mut dispatcher).await.unwrap();
        assert_eq!(dispatcher.dispatched(), 0);
    }
}
