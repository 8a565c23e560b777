use super::fetcher::{resolve_link, submit, PageFetcher};
use super::options::CommonArgs;
use super::{Crawler, Page, CRAWLER_VB_ATTACHMENTS};
use crate::cli::parse_options;
use crate::config::Settings;
use crate::download::{file_name_from_url, rename_from_header, DownloadDispatcher};
use crate::html::{attr_val, element_by_id, elements_by_attr_match, parse_document};
use crate::{ConfigResult, CrawlError};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;

const POSTS_CONTAINER_ID: &str = "posts";

static POST_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^post_?([0-9]+)$").expect("valid regex"));
static ATTACHMENT_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^attachment[0-9]+$").expect("valid regex"));

#[derive(Debug, clap::Parser)]
struct AttachmentOptions {
    #[command(flatten)]
    common: CommonArgs,

    /// Name files after the name sent in the Content-Disposition header
    #[arg(long)]
    names_from_header: bool,
}

/// One post with the raw hrefs of its attachments
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct Post {
    pub id: String,
    pub attachments: Vec<String>,
}

/// Finds the posts of a vBulletin 4 thread page
///
/// Returns `None` if the page has no posts container or no posts in it.
pub(super) fn extract_posts(body: &str) -> Option<Vec<Post>> {
    let document = parse_document(body);
    let container = element_by_id(document.root_element(), POSTS_CONTAINER_ID)?;

    let posts: Vec<Post> = elements_by_attr_match(container, "id", &POST_ID)
        .into_iter()
        .filter_map(|post| {
            let id = attr_val(post, "id")
                .and_then(|id| POST_ID.captures(id))
                .and_then(|caps| caps.get(1))?
                .as_str()
                .to_string();
            tracing::debug!("Found post {:?}", id);

            let attachments = elements_by_attr_match(post, "id", &ATTACHMENT_ID)
                .into_iter()
                .filter_map(|attachment| {
                    let href = attr_val(attachment, "href");
                    if href.is_none() {
                        tracing::debug!(
                            "Attachment {:?} has no link",
                            attr_val(attachment, "id").unwrap_or_default()
                        );
                    }
                    href.map(str::to_string)
                })
                .collect();
            Some(Post { id, attachments })
        })
        .collect();

    if posts.is_empty() {
        None
    } else {
        Some(posts)
    }
}

/// Downloads the attachments of vBulletin 4 posts
///
/// Files are named `<post id> - <file name>`, the file name coming either
/// from the link or, with `--names-from-header`, from the server.
pub struct AttachmentCrawler {
    fetcher: PageFetcher,
    names_from_header: bool,
}

impl AttachmentCrawler {
    pub fn new(settings: Settings) -> Self {
        Self {
            fetcher: PageFetcher::new(settings),
            names_from_header: false,
        }
    }
}

#[async_trait]
impl Crawler for AttachmentCrawler {
    fn set_options(&mut self, args: &[String]) -> ConfigResult<()> {
        let options: AttachmentOptions = parse_options(CRAWLER_VB_ATTACHMENTS, args)?;
        self.fetcher.configure(options.common);
        self.names_from_header = options.names_from_header;
        Ok(())
    }

    async fn crawl(
        &mut self,
        page: &Page,
        dispatcher: &mut DownloadDispatcher,
    ) -> Result<(), CrawlError> {
        let body = self.fetcher.get_page(&page.url).await?;
        let Some(posts) = extract_posts(&body) else {
            tracing::error!("No posts found at page {:?}", page.url.as_str());
            return Ok(());
        };

        for post in posts {
            for href in &post.attachments {
                let Some(url) = resolve_link(&page.url, href) else {
                    continue;
                };

                let job = if self.names_from_header {
                    self.fetcher
                        .download(&page.url, url, self.fetcher.output(), "")
                        .map(|job| job.with_after_download(rename_from_header(post.id.clone())))
                } else {
                    let name = file_name_from_url(&url);
                    if name.is_empty() {
                        tracing::error!("File {:?} could not be downloaded.", url.as_str());
                        continue;
                    }
                    let name = format!("{} - {}", post.id, name);
                    self.fetcher
                        .download(&page.url, url, self.fetcher.output(), &name)
                };
                submit(dispatcher, job).await;
            }
        }
        Ok(())
    }
}
