use super::fetcher::{resolve_link, submit, PageFetcher};
use super::options::{parse_attrs, AttrFilter, CommonArgs};
use super::{Crawler, Page, CRAWLER_IMG};
use crate::cli::parse_options;
use crate::config::Settings;
use crate::download::{apparent_extension, DownloadDispatcher};
use crate::html::{attr_val, elements_by_tag_and_attrs, parse_document, AttrPair};
use crate::{ConfigResult, CrawlError};
use async_trait::async_trait;
use url::Url;

#[derive(Debug, clap::Parser)]
struct ImgOptions {
    #[command(flatten)]
    common: CommonArgs,

    /// Element to collect links from
    #[arg(long, default_value = "img")]
    tag: String,

    /// Attribute holding the link
    #[arg(long, default_value = "src")]
    attr: String,

    /// Only collect elements carrying these attributes
    #[arg(long, value_parser = parse_attrs)]
    attrs: Option<AttrFilter>,
}

/// Collects the links of one tag/attribute combination, in document order
pub(super) fn extract_links(body: &str, tag: &str, attr: &str, attrs: &[AttrPair]) -> Vec<String> {
    let document = parse_document(body);
    elements_by_tag_and_attrs(document.root_element(), tag, attrs)
        .into_iter()
        .filter_map(|element| attr_val(element, attr))
        .filter(|link| !link.trim().is_empty())
        .map(str::to_string)
        .collect()
}

/// Sequential `<page>-<n>.<ext>` names for the links of one page
pub(super) struct SequenceNamer {
    page: i64,
    next: u64,
}

impl SequenceNamer {
    pub fn new(page: i64) -> Self {
        Self { page, next: 1 }
    }

    /// Names `link` after its apparent extension; links without one get no name
    pub fn name(&mut self, link: &Url) -> Option<String> {
        let Some(ext) = apparent_extension(link) else {
            tracing::error!("No suffix available in url path {:?}", link.path());
            return None;
        };
        let n = self.take();
        Some(format!("{}-{}.{}", self.page, n, ext))
    }

    /// Hands out the next sequence number
    pub fn take(&mut self) -> u64 {
        let n = self.next;
        self.next += 1;
        n
    }
}

/// Downloads the links of one tag/attribute combination (images by default)
pub struct ImgCrawler {
    fetcher: PageFetcher,
    tag: String,
    attr: String,
    attrs: Vec<AttrPair>,
}

impl ImgCrawler {
    pub fn new(settings: Settings) -> Self {
        Self {
            fetcher: PageFetcher::new(settings),
            tag: "img".to_string(),
            attr: "src".to_string(),
            attrs: Vec::new(),
        }
    }
}

#[async_trait]
impl Crawler for ImgCrawler {
    fn set_options(&mut self, args: &[String]) -> ConfigResult<()> {
        let options: ImgOptions = parse_options(CRAWLER_IMG, args)?;
        self.fetcher.configure(options.common);
        self.tag = options.tag.to_ascii_lowercase();
        self.attr = options.attr;
        self.attrs = options.attrs.unwrap_or_default().0;
        Ok(())
    }

    async fn crawl(
        &mut self,
        page: &Page,
        dispatcher: &mut DownloadDispatcher,
    ) -> Result<(), CrawlError> {
        let body = self.fetcher.get_page(&page.url).await?;
        let links = extract_links(&body, &self.tag, &self.attr, &self.attrs);
        tracing::debug!("Found {} links on page {}", links.len(), page.number);

        let mut namer = SequenceNamer::new(page.number);
        for link in links {
            let Some(url) = resolve_link(&page.url, &link) else {
                continue;
            };
            if self.fetcher.is_excluded(&url) {
                tracing::info!("Skipping excluded URL {}", url);
                continue;
            }
            let Some(name) = namer.name(&url) else {
                continue;
            };
            let job = self
                .fetcher
                .download(&page.url, url, self.fetcher.output(), &name);
            submit(dispatcher, job).await;
        }
        Ok(())
    }
}
