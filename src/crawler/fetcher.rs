//! Page fetching shared by all crawlers
//!
//! This module owns the HTTP side of a crawler:
//! - Building the client lazily on the first page, seeding the cookie jar
//! - GET requests for pages, with status and Content-Type checks
//! - Exclusion checks for extracted links
//! - Optional header dumps for debugging

use super::options::CommonArgs;
use super::redirect::RedirectPolicy;
use crate::config::Settings;
use crate::cookies::seed_jar;
use crate::download::{Download, DownloadDispatcher};
use crate::CrawlError;
use once_cell::sync::OnceCell;
use reqwest::cookie::Jar;
use reqwest::header::{HeaderMap, CONTENT_TYPE};
use reqwest::Client;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use url::Url;

const DEBUG_DIR: &str = "debug";

/// HTTP state of one crawler
pub struct PageFetcher {
    settings: Settings,
    redirect: RedirectPolicy,
    excluded: Vec<Url>,
    debug: bool,
    debug_counter: u64,
    jar: Arc<Jar>,
    client: OnceCell<Client>,
}

impl PageFetcher {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            redirect: RedirectPolicy::default(),
            excluded: Vec::new(),
            debug: false,
            debug_counter: 0,
            jar: Arc::new(Jar::default()),
            client: OnceCell::new(),
        }
    }

    /// Applies the options shared by all crawlers
    pub fn configure(&mut self, args: CommonArgs) {
        self.excluded = args.exclude;
        self.redirect = RedirectPolicy::from_allowed(args.redirect);
        self.debug = args.debug;
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Output directory for downloads
    pub fn output(&self) -> &Path {
        &self.settings.output
    }

    pub fn redirect_policy(&self) -> RedirectPolicy {
        self.redirect
    }

    /// Returns the crawl's client, building it on first use
    ///
    /// The cookie jar is seeded with the preloaded cookies for the scheme and
    /// host of `page` when the client is built. Later calls return the same
    /// client and leave the jar alone.
    pub fn client(&self, page: &Url) -> Result<Client, CrawlError> {
        self.client
            .get_or_try_init(|| {
                if !self.settings.cookies.is_empty() {
                    seed_jar(&self.jar, &self.settings.cookies, page);
                }
                Client::builder()
                    .user_agent(self.settings.user_agent.as_str())
                    .timeout(self.settings.timeout)
                    .cookie_provider(Arc::clone(&self.jar))
                    .redirect(self.redirect.policy())
                    .gzip(true)
                    .brotli(true)
                    .build()
                    .map_err(CrawlError::Client)
            })
            .cloned()
    }

    /// Fetches `url` and returns its decoded body
    ///
    /// Transport failures, non-2xx statuses and responses without a
    /// Content-Type header are errors. The body is decoded using the charset
    /// announced in the Content-Type header.
    pub async fn get_page(&mut self, url: &Url) -> Result<String, CrawlError> {
        let client = self.client(url)?;
        let http_error = |source| CrawlError::Http {
            url: url.to_string(),
            source,
        };

        let request = client.get(url.clone()).build().map_err(http_error)?;
        if self.debug {
            self.dump_headers("Request Header", request.headers()).await;
        }
        let response = client.execute(request).await.map_err(http_error)?;
        if self.debug {
            self.dump_headers("Response Header", response.headers()).await;
        }

        let status = response.status();
        if !status.is_success() {
            return Err(CrawlError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        if !response.headers().contains_key(CONTENT_TYPE) {
            return Err(CrawlError::MissingContentType {
                url: url.to_string(),
            });
        }

        tracing::debug!("Fetched page {}", url);
        response.text().await.map_err(http_error)
    }

    /// Checks `url` against the exclusion list by exact string comparison
    pub fn is_excluded(&self, url: &Url) -> bool {
        self.excluded.iter().any(|ex| ex.as_str() == url.as_str())
    }

    /// Creates a download of `addr` into `dir`, named `name` (or resolved at
    /// execution time if `name` is empty)
    ///
    /// Returns `None` for excluded links and for links that cannot be turned
    /// into a job; both are logged.
    pub fn download(&self, page: &Url, addr: Url, dir: &Path, name: &str) -> Option<Download> {
        if self.is_excluded(&addr) {
            tracing::info!("Skipping excluded URL {}", addr);
            return None;
        }
        let client = match self.client(page) {
            Ok(client) => client,
            Err(e) => {
                tracing::error!("{}", e);
                return None;
            }
        };

        let job = Download::new(client, addr.clone(), dir).and_then(|job| {
            if name.is_empty() {
                Ok(job)
            } else {
                job.with_file(name)
            }
        });
        match job {
            Ok(job) => Some(job),
            Err(e) => {
                tracing::error!("File {:?} could not be downloaded: {}", addr.as_str(), e);
                None
            }
        }
    }

    async fn dump_headers(&mut self, name: &str, headers: &HeaderMap) {
        let dir = self.settings.output.join(DEBUG_DIR);
        let path = dir.join(format!("{} - {}.txt", self.debug_counter, name));
        self.debug_counter += 1;
        if let Err(e) = write_headers(&dir, &path, headers).await {
            tracing::error!("DumpHeader failed: {}", e);
        }
    }
}

async fn write_headers(dir: &Path, path: &PathBuf, headers: &HeaderMap) -> std::io::Result<()> {
    tokio::fs::create_dir_all(dir).await?;
    let mut content = String::new();
    for (key, value) in headers {
        content.push_str(key.as_str());
        content.push_str(":\t");
        content.push_str(&String::from_utf8_lossy(value.as_bytes()));
        content.push('\n');
    }
    tokio::fs::write(path, content).await
}

/// Resolves `link` against the page it was found on
pub fn resolve_link(page: &Url, link: &str) -> Option<Url> {
    match page.join(link.trim()) {
        Ok(url) => Some(url),
        Err(e) => {
            tracing::error!("File {:?} could not be downloaded: {}", link, e);
            None
        }
    }
}

/// Hands `job` to the dispatcher, waiting for a free slot
pub async fn submit(dispatcher: &mut DownloadDispatcher, job: Option<Download>) {
    if let Some(job) = job {
        dispatcher.dispatch(job).await;
    }
}
