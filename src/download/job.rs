use super::naming::{filename_from_content_disposition, validate_file_name};
use super::DownloadError;
use async_trait::async_trait;
use reqwest::header::CONTENT_DISPOSITION;
use reqwest::{Client, Response};
use std::fmt;
use std::path::{Path, PathBuf};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use url::Url;

/// Post-processing step run after the body has been written to disk
#[async_trait]
pub trait AfterDownload: Send + Sync {
    async fn run(&self, download: &mut Download) -> Result<(), DownloadError>;
}

/// One fetch-to-disk job
///
/// A `Download` is created by a crawler, handed to the
/// [`super::DownloadDispatcher`] and comes back through the completion queue
/// with either no error (file written) or its terminal error set.
pub struct Download {
    /// HTTP client used for the request
    pub client: Client,

    /// Absolute address of the resource
    pub addr: Url,

    /// Replace an existing destination file instead of failing
    pub allow_overwrite: bool,

    /// Optional hook run after a successful fetch
    pub after_download: Option<Box<dyn AfterDownload>>,

    dir: PathBuf,
    file: String,
    id: u64,
    bytes: u64,
    fetched: bool,
    server_name: Option<String>,
    error: Option<DownloadError>,
}

impl Download {
    /// Creates a job fetching `addr` into the directory `dir`
    ///
    /// `dir` must be an absolute path of an existing directory. The file name
    /// is left empty; it is resolved from the response headers at execution
    /// time unless [`Download::set_file`] is called.
    pub fn new(client: Client, addr: Url, dir: impl Into<PathBuf>) -> Result<Self, DownloadError> {
        let dir = dir.into();
        if !dir.is_absolute() || !dir.is_dir() {
            return Err(DownloadError::InvalidDirectory { path: dir });
        }

        Ok(Self {
            client,
            addr,
            allow_overwrite: false,
            after_download: None,
            dir,
            file: String::new(),
            id: 0,
            bytes: 0,
            fetched: false,
            server_name: None,
            error: None,
        })
    }

    /// Sets the destination file name, rejecting names with path separators
    pub fn set_file(&mut self, name: &str) -> Result<(), DownloadError> {
        validate_file_name(name)?;
        self.file = name.to_string();
        Ok(())
    }

    /// Builder form of [`Download::set_file`]
    pub fn with_file(mut self, name: &str) -> Result<Self, DownloadError> {
        self.set_file(name)?;
        Ok(self)
    }

    /// Attaches a post-processing hook
    pub fn with_after_download(mut self, hook: impl AfterDownload + 'static) -> Self {
        self.after_download = Some(Box::new(hook));
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn file(&self) -> &str {
        &self.file
    }

    /// Full destination path
    pub fn path(&self) -> PathBuf {
        self.dir.join(&self.file)
    }

    /// Id assigned by the dispatcher; 0 until dispatched
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Number of body bytes written to disk
    pub fn bytes_written(&self) -> u64 {
        self.bytes
    }

    /// True once the whole body has been written to the destination file
    ///
    /// A job that failed with `fetched() == true` failed in post-processing.
    pub fn fetched(&self) -> bool {
        self.fetched
    }

    /// File name announced by the server in the GET response, if any
    pub fn server_file_name(&self) -> Option<&str> {
        self.server_name.as_deref()
    }

    /// Terminal error of a completed job
    pub fn error(&self) -> Option<&DownloadError> {
        self.error.as_ref()
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// Renames the written file inside its directory
    ///
    /// Refuses to replace an existing file unless overwriting is allowed.
    pub async fn rename(&mut self, new_name: &str) -> Result<(), DownloadError> {
        validate_file_name(new_name)?;
        let target = self.dir.join(new_name);
        if !self.allow_overwrite && tokio::fs::try_exists(&target).await? {
            return Err(DownloadError::AlreadyExists { path: target });
        }
        tokio::fs::rename(self.path(), &target).await?;
        self.file = new_name.to_string();
        Ok(())
    }

    pub(super) fn assign_id(&mut self, id: u64) {
        self.id = id;
    }

    pub(super) fn set_error(&mut self, error: DownloadError) {
        self.error = Some(error);
    }

    /// Executes the job: resolve the name, fetch, write and post-process
    pub(super) async fn execute(&mut self) -> Result<(), DownloadError> {
        if self.file.is_empty() {
            self.file = match self.name_from_head().await {
                Some(name) => name,
                None => format!("{}.download", self.id),
            };
        }

        let path = self.path();
        if !self.allow_overwrite && tokio::fs::try_exists(&path).await? {
            return Err(DownloadError::AlreadyExists { path });
        }

        let mut response = self
            .client
            .get(self.addr.clone())
            .send()
            .await
            .map_err(|source| self.http_error(source))?;
        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::Status {
                url: self.addr.to_string(),
                status: status.as_u16(),
            });
        }
        self.server_name = header_file_name(&response);

        // Fails if another job created the file after the existence check
        let mut options = OpenOptions::new();
        options.write(true);
        if self.allow_overwrite {
            options.create(true).truncate(true);
        } else {
            options.create_new(true);
        }
        let mut file = options.open(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::AlreadyExists {
                DownloadError::AlreadyExists { path: path.clone() }
            } else {
                DownloadError::Io(e)
            }
        })?;

        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|source| self.http_error(source))?
        {
            file.write_all(&chunk).await?;
            self.bytes += chunk.len() as u64;
        }
        file.flush().await?;
        drop(file);
        self.fetched = true;

        if let Some(hook) = self.after_download.take() {
            hook.run(self).await?;
        }
        Ok(())
    }

    /// Asks the server for a file name via a HEAD request
    async fn name_from_head(&self) -> Option<String> {
        match self.client.head(self.addr.clone()).send().await {
            Ok(response) => header_file_name(&response),
            Err(e) => {
                tracing::debug!("HEAD {} failed: {}", self.addr, e);
                None
            }
        }
    }

    fn http_error(&self, source: reqwest::Error) -> DownloadError {
        DownloadError::Http {
            url: self.addr.to_string(),
            source,
        }
    }
}

impl fmt::Debug for Download {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Download")
            .field("id", &self.id)
            .field("addr", &self.addr.as_str())
            .field("dir", &self.dir)
            .field("file", &self.file)
            .field("allow_overwrite", &self.allow_overwrite)
            .field("after_download", &self.after_download.is_some())
            .field("bytes", &self.bytes)
            .field("error", &self.error)
            .finish()
    }
}

fn header_file_name(response: &Response) -> Option<String> {
    response
        .headers()
        .get_all(CONTENT_DISPOSITION)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find_map(filename_from_content_disposition)
}

/// Hook renaming the file to the name announced in `Content-Disposition`
///
/// With a non-empty `prefix` the final name is `"<prefix> - <name>"`.
#[derive(Debug, Clone)]
pub struct RenameFromHeader {
    prefix: String,
}

pub fn rename_from_header(prefix: String) -> RenameFromHeader {
    RenameFromHeader { prefix }
}

#[async_trait]
impl AfterDownload for RenameFromHeader {
    async fn run(&self, download: &mut Download) -> Result<(), DownloadError> {
        let Some(name) = download.server_file_name().map(str::to_string) else {
            return Err(DownloadError::Rename {
                name: download.file().to_string(),
                new_name: String::new(),
                source: Box::new(DownloadError::NoFileName {
                    url: download.addr.to_string(),
                }),
            });
        };

        let new_name = if self.prefix.is_empty() {
            name
        } else {
            format!("{} - {}", self.prefix, name)
        };
        if new_name == download.file() {
            return Ok(());
        }

        match download.rename(&new_name).await {
            Ok(()) => Ok(()),
            Err(source) => Err(DownloadError::Rename {
                name: download.file().to_string(),
                new_name,
                source: Box::new(source),
            }),
        }
    }
}
