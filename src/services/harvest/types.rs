//! Harvest service types, errors, and events.

use std::path::PathBuf;

use reqwest::StatusCode;
use thiserror::Error;

use crate::discovery::StrategyFailure;
use crate::models::FailureReason;
use crate::repository::DieselError;

/// Errors surfaced to callers of the harvest service.
///
/// Every variant carries the URL or path it concerns.
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("failed to fetch page {url}: {source}")]
    PageFetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("page {url} returned HTTP {status}")]
    PageStatus { url: String, status: StatusCode },

    #[error("invalid page URL {url}: {source}")]
    PageUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("failed to download {url}: {source}")]
    Download {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("download of {url} returned HTTP {status}")]
    DownloadStatus { url: String, status: StatusCode },

    #[error("rejected {url}: {reason}")]
    Rejected { url: String, reason: FailureReason },

    #[error("failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to persist record for {url}: {source}")]
    Persistence {
        url: String,
        #[source]
        source: DieselError,
    },
}

impl HarvestError {
    /// URL the error concerns, when it concerns one.
    pub fn url(&self) -> Option<&str> {
        match self {
            Self::PageFetch { url, .. }
            | Self::PageStatus { url, .. }
            | Self::PageUrl { url, .. }
            | Self::Download { url, .. }
            | Self::DownloadStatus { url, .. }
            | Self::Rejected { url, .. }
            | Self::Persistence { url, .. } => Some(url),
            Self::Io { .. } => None,
        }
    }

    /// Failure reason recorded for a candidate that hit this error.
    pub fn failure_reason(&self) -> FailureReason {
        match self {
            Self::Rejected { reason, .. } => *reason,
            Self::Io { .. } => FailureReason::WriteError,
            _ => FailureReason::DownloadError,
        }
    }
}

/// Where a scan's records come from and where its files go.
#[derive(Debug, Clone)]
pub struct ScanRequest {
    pub page_url: String,
    pub title: String,
    pub download_dir: PathBuf,
    /// Feed theme, or `"manual"` for ad-hoc scans.
    pub source_feed: String,
}

impl ScanRequest {
    pub fn new(page_url: &str, title: &str, download_dir: impl Into<PathBuf>) -> Self {
        Self {
            page_url: page_url.to_string(),
            title: title.to_string(),
            download_dir: download_dir.into(),
            source_feed: MANUAL_SOURCE.to_string(),
        }
    }

    pub fn with_source_feed(mut self, source_feed: &str) -> Self {
        self.source_feed = source_feed.to_string();
        self
    }
}

/// `source_feed` value for scans not driven by a feed.
pub const MANUAL_SOURCE: &str = "manual";

/// A saved PDF.
#[derive(Debug, Clone)]
pub struct SavedPdf {
    pub url: String,
    pub filename: String,
    pub bytes: u64,
}

/// Outcome of one page scan.
#[derive(Debug, Default)]
pub struct ScanReport {
    pub page_url: String,
    /// Distinct candidates found by all strategies.
    pub candidates: usize,
    /// Candidates skipped because they were already resolved.
    pub skipped: usize,
    /// PDFs that newly succeeded in this scan.
    pub saved: Vec<SavedPdf>,
    /// Per-candidate failures (download, validation, write, persistence).
    pub errors: Vec<HarvestError>,
    pub strategy_failures: Vec<StrategyFailure>,
}

impl ScanReport {
    /// URLs that newly succeeded in this scan.
    pub fn new_urls(&self) -> Vec<String> {
        self.saved.iter().map(|s| s.url.clone()).collect()
    }
}

/// Events emitted while scanning a batch of pages.
#[derive(Debug, Clone)]
pub enum HarvestEvent {
    PageStarted {
        worker_id: usize,
        page_url: String,
        title: String,
    },
    PdfSaved {
        worker_id: usize,
        url: String,
        filename: String,
        bytes: u64,
    },
    PdfRejected {
        worker_id: usize,
        url: String,
        error: String,
    },
    PageFailed {
        worker_id: usize,
        page_url: String,
        error: String,
    },
    PageFinished {
        worker_id: usize,
        page_url: String,
        new_pdfs: usize,
    },
}
