//! Reporting of download outcomes
//!
//! The crawl context carries a [`Reporter`] that is told about every
//! completed download. [`LogReporter`] writes to the tracing log;
//! [`MemoryReporter`] keeps the outcomes for later inspection.

use crate::download::{Completions, Download, DownloadError};
use std::error::Error as _;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// Sink for per-job outcomes
pub trait Reporter: Send + Sync {
    /// Called once for every completed download, in completion order
    fn download_finished(&self, download: &Download);
}

/// Reports outcomes through `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct LogReporter;

impl Reporter for LogReporter {
    fn download_finished(&self, download: &Download) {
        match download.error() {
            None => tracing::info!(
                "Download complete: {} → {}",
                download.addr,
                download.path().display()
            ),
            Some(error @ DownloadError::Rename { .. }) => match error.source() {
                Some(cause) => tracing::error!("{}: {}", error, cause),
                None => tracing::error!("{}", error),
            },
            Some(error) => {
                tracing::error!("Download failed {:?}: {}", download.addr.as_str(), error)
            }
        }
    }
}

/// One recorded outcome
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub id: u64,
    pub url: String,
    pub path: PathBuf,
    pub error: Option<String>,
}

/// Keeps every outcome in memory
#[derive(Debug, Default)]
pub struct MemoryReporter {
    outcomes: Mutex<Vec<Outcome>>,
}

impl MemoryReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the outcomes recorded so far, in completion order
    pub fn outcomes(&self) -> Vec<Outcome> {
        self.outcomes
            .lock()
            .map(|outcomes| outcomes.clone())
            .unwrap_or_default()
    }
}

impl Reporter for MemoryReporter {
    fn download_finished(&self, download: &Download) {
        if let Ok(mut outcomes) = self.outcomes.lock() {
            outcomes.push(Outcome {
                id: download.id(),
                url: download.addr.to_string(),
                path: download.path(),
                error: download.error().map(ToString::to_string),
            });
        }
    }
}

/// Success and failure counts of the downloads of one crawl
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DownloadTally {
    pub succeeded: usize,
    pub failed: usize,
}

/// Drains `completions`, reporting every job, until the dispatcher closes
pub async fn report_completions(
    mut completions: Completions,
    reporter: Arc<dyn Reporter>,
) -> DownloadTally {
    let mut tally = DownloadTally::default();
    while let Some(download) = completions.collect().await {
        reporter.download_finished(&download);
        if download.is_success() {
            tally.succeeded += 1;
        } else {
            tally.failed += 1;
        }
    }
    tally
}
