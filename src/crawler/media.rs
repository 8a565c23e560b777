use super::fetcher::{resolve_link, submit, PageFetcher};
use super::img::SequenceNamer;
use super::options::{parse_attrs, AttrFilter, CommonArgs};
use super::{Crawler, Page, CRAWLER_SRC};
use crate::cli::parse_options;
use crate::config::Settings;
use crate::download::{DownloadDispatcher, NameTable};
use crate::html::{attr_val, elements_by_tag, match_attrs, parse_document, AttrPair};
use crate::{ConfigError, ConfigResult, CrawlError};
use async_trait::async_trait;

const SRC: &str = "src";
const SOURCE_TAGS: &[&str] = &["source", "track"];

/// Elements the `src` crawler knows how to scrape
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, clap::ValueEnum)]
pub enum MediaTag {
    Audio,
    Img,
    Video,
}

impl MediaTag {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Audio => "audio",
            Self::Img => "img",
            Self::Video => "video",
        }
    }
}

#[derive(Debug, clap::Parser)]
struct SrcOptions {
    #[command(flatten)]
    common: CommonArgs,

    /// Download sources contained within the given tags
    #[arg(long, value_enum, value_delimiter = ',', required = true)]
    tags: Vec<MediaTag>,

    /// Only collect elements carrying these attributes
    #[arg(long, value_parser = parse_attrs)]
    attrs: Option<AttrFilter>,
}

/// What one matching element asks to download
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum MediaItem {
    Image(String),
    Sources(Vec<String>),
}

/// Collects the downloadable sources of the whitelisted elements, in
/// document order
pub(super) fn extract_media(body: &str, tags: &[MediaTag], attrs: &[AttrPair]) -> Vec<MediaItem> {
    let document = parse_document(body);
    let names: Vec<&str> = tags.iter().map(|tag| tag.as_str()).collect();

    elements_by_tag(document.root_element(), &names)
        .into_iter()
        .filter(|element| match_attrs(*element, attrs))
        .filter_map(|element| {
            let own = attr_val(element, SRC).filter(|link| !link.is_empty());
            if element.value().name() == MediaTag::Img.as_str() {
                return own.map(|link| MediaItem::Image(link.to_string()));
            }

            let sources: Vec<String> = own
                .into_iter()
                .chain(
                    elements_by_tag(element, SOURCE_TAGS)
                        .into_iter()
                        .filter_map(|child| attr_val(child, SRC))
                        .filter(|link| !link.is_empty()),
                )
                .map(str::to_string)
                .collect();
            Some(MediaItem::Sources(sources))
        })
        .collect()
}

/// Downloads the sources of `<img>`, `<audio>` and `<video>` elements
///
/// Single sources are named `<page>-<n>.<ext>`. An element with several
/// sources gets its own directory `<page>-<n>`, the files in it keeping the
/// names from their URLs.
pub struct SrcCrawler {
    fetcher: PageFetcher,
    tags: Vec<MediaTag>,
    attrs: Vec<AttrPair>,
}

impl SrcCrawler {
    pub fn new(settings: Settings) -> Self {
        Self {
            fetcher: PageFetcher::new(settings),
            tags: Vec::new(),
            attrs: Vec::new(),
        }
    }

    async fn single(
        &self,
        page: &Page,
        namer: &mut SequenceNamer,
        link: &str,
        dispatcher: &mut DownloadDispatcher,
    ) {
        let Some(url) = resolve_link(&page.url, link) else {
            return;
        };
        if self.fetcher.is_excluded(&url) {
            tracing::info!("Skipping excluded URL {}", url);
            return;
        }
        let Some(name) = namer.name(&url) else {
            return;
        };
        let job = self
            .fetcher
            .download(&page.url, url, self.fetcher.output(), &name);
        submit(dispatcher, job).await;
    }

    async fn multiple(
        &self,
        page: &Page,
        namer: &mut SequenceNamer,
        links: &[String],
        dispatcher: &mut DownloadDispatcher,
    ) {
        let mut table = NameTable::new();
        for link in links {
            let Some(url) = resolve_link(&page.url, link) else {
                continue;
            };
            if self.fetcher.is_excluded(&url) {
                tracing::info!("Skipping excluded URL {}", url);
                continue;
            }
            if let Err(e) = table.add(&url) {
                tracing::error!("Download error: {}", e);
            }
        }
        if table.is_empty() {
            return;
        }

        let dir = self
            .fetcher
            .output()
            .join(format!("{}-{}", page.number, namer.take()));
        if let Err(e) = tokio::fs::create_dir_all(&dir).await {
            tracing::error!("Download error: {}: {}", dir.display(), e);
            return;
        }

        let jobs: Vec<_> = table
            .entries()
            .map(|(url, name)| self.fetcher.download(&page.url, url.clone(), &dir, name))
            .collect();
        for job in jobs {
            submit(dispatcher, job).await;
        }
    }
}

#[async_trait]
impl Crawler for SrcCrawler {
    fn set_options(&mut self, args: &[String]) -> ConfigResult<()> {
        let options: SrcOptions = parse_options(CRAWLER_SRC, args)?;
        if options.tags.is_empty() {
            return Err(ConfigError::options(CRAWLER_SRC, "no html tag specified with --tags"));
        }
        self.fetcher.configure(options.common);
        self.tags = options.tags;
        self.tags.sort();
        self.tags.dedup();
        self.attrs = options.attrs.unwrap_or_default().0;
        Ok(())
    }

    async fn crawl(
        &mut self,
        page: &Page,
        dispatcher: &mut DownloadDispatcher,
    ) -> Result<(), CrawlError> {
        let body = self.fetcher.get_page(&page.url).await?;
        let items = extract_media(&body, &self.tags, &self.attrs);

        let mut namer = SequenceNamer::new(page.number);
        for item in items {
            match item {
                MediaItem::Image(link) => self.single(page, &mut namer, &link, dispatcher).await,
                MediaItem::Sources(links) => match links.as_slice() {
                    [] => {}
                    [link] => self.single(page, &mut namer, link, dispatcher).await,
                    _ => self.multiple(page, &mut namer, &links, dispatcher).await,
                },
            }
        }
        Ok(())
    }
}
