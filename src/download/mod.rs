//! Download jobs and their bounded-concurrency dispatcher
//!
//! This module contains:
//! - [`Download`]: one fetch-to-disk job with an optional post-processing hook
//! - [`DownloadDispatcher`]: the worker pool executing jobs under a cap
//! - naming helpers shared by the crawlers

mod dispatcher;
mod error;
mod job;
mod naming;

pub use dispatcher::{Completions, DownloadDispatcher};
pub use error::DownloadError;
pub use job::{rename_from_header, AfterDownload, Download, RenameFromHeader};
pub use naming::{
    apparent_extension, file_name_from_url, filename_from_content_disposition,
    validate_file_name, NameTable,
};
