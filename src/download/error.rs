use std::path::PathBuf;
use thiserror::Error;

/// Errors of a single download job
///
/// These are recorded on the [`super::Download`] and surface only through the
/// dispatcher's completion queue; they never abort a crawl.
#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("file already exists: {}", path.display())]
    AlreadyExists { path: PathBuf },

    #[error("invalid file name {name:?}: {reason}")]
    InvalidFileName { name: String, reason: &'static str },

    #[error("not a usable download directory: {}", path.display())]
    InvalidDirectory { path: PathBuf },

    #[error("URL {url:?}: no filename found in Content-Disposition header")]
    NoFileName { url: String },

    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP status {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The bytes were fetched and written, but the post-processing rename failed
    #[error("Cannot rename file {name:?} to {new_name:?}")]
    Rename {
        name: String,
        new_name: String,
        #[source]
        source: Box<DownloadError>,
    },
}

impl DownloadError {
    /// Returns true for failures raised by a post-processing hook
    pub fn is_post_process(&self) -> bool {
        matches!(self, Self::Rename { .. })
    }
}
