//! Harvested PDF records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Outcome recorded for a candidate PDF URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HarvestStatus {
    /// Downloaded, validated, and written to disk.
    Success,
    /// Download or validation failed.
    Failed,
    /// Discovered on a page but not downloaded.
    Detected,
}

impl HarvestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failed => "failed",
            Self::Detected => "detected",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "success" => Some(Self::Success),
            "failed" => Some(Self::Failed),
            "detected" => Some(Self::Detected),
            _ => None,
        }
    }
}

impl std::fmt::Display for HarvestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a candidate ended up `failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    /// Body does not start with `%PDF`.
    SignatureMismatch,
    /// Body starts with `%PDF` but is below the size floor.
    TooSmall,
    /// Network error, timeout, or non-success status.
    DownloadError,
    /// Bytes could not be written to the download directory.
    WriteError,
}

impl FailureReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SignatureMismatch => "signature_mismatch",
            Self::TooSmall => "too_small",
            Self::DownloadError => "download_error",
            Self::WriteError => "write_error",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "signature_mismatch" => Some(Self::SignatureMismatch),
            "too_small" => Some(Self::TooSmall),
            "download_error" => Some(Self::DownloadError),
            "write_error" => Some(Self::WriteError),
            _ => None,
        }
    }
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The persisted outcome of resolving one candidate URL.
///
/// `url` is the only stable identity; a later record for the same URL
/// replaces this one in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HarvestedPdf {
    pub url: String,
    pub filename: String,
    pub file_size: u64,
    pub content_hash: String,
    pub source_feed: String,
    pub harvest_date: DateTime<Utc>,
    pub status: HarvestStatus,
    pub failure_reason: Option<FailureReason>,
    pub article_title: String,
    pub article_url: String,
}

impl HarvestedPdf {
    /// Record for a PDF that was downloaded and written to disk.
    pub fn success(
        url: &str,
        filename: &str,
        content: &[u8],
        source_feed: &str,
        article_title: &str,
        article_url: &str,
    ) -> Self {
        Self {
            url: url.to_string(),
            filename: filename.to_string(),
            file_size: content.len() as u64,
            content_hash: Self::compute_hash(content),
            source_feed: source_feed.to_string(),
            harvest_date: Utc::now(),
            status: HarvestStatus::Success,
            failure_reason: None,
            article_title: article_title.to_string(),
            article_url: article_url.to_string(),
        }
    }

    /// Record for a candidate whose download or validation failed.
    pub fn failed(
        url: &str,
        reason: FailureReason,
        source_feed: &str,
        article_title: &str,
        article_url: &str,
    ) -> Self {
        Self {
            status: HarvestStatus::Failed,
            failure_reason: Some(reason),
            ..Self::detected(url, source_feed, article_title, article_url)
        }
    }

    /// Record for a candidate that was discovered but not downloaded.
    pub fn detected(url: &str, source_feed: &str, article_title: &str, article_url: &str) -> Self {
        Self {
            url: url.to_string(),
            filename: String::new(),
            file_size: 0,
            content_hash: Self::compute_hash(url.as_bytes()),
            source_feed: source_feed.to_string(),
            harvest_date: Utc::now(),
            status: HarvestStatus::Detected,
            failure_reason: None,
            article_title: article_title.to_string(),
            article_url: article_url.to_string(),
        }
    }

    /// Compute SHA-256 hash of content.
    pub fn compute_hash(content: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(content);
        hex::encode(hasher.finalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_str() {
        for status in [
            HarvestStatus::Success,
            HarvestStatus::Failed,
            HarvestStatus::Detected,
        ] {
            assert_eq!(HarvestStatus::from_str(status.as_str()), Some(status));
        }
        assert_eq!(HarvestStatus::from_str("pending"), None);
    }

    #[test]
    fn success_record_hashes_content() {
        let body = b"%PDF-1.7 body";
        let record = HarvestedPdf::success(
            "https://x.test/a.pdf",
            "a.pdf",
            body,
            "Air",
            "Title",
            "https://x.test/article",
        );
        assert_eq!(record.file_size, body.len() as u64);
        assert_eq!(record.content_hash, HarvestedPdf::compute_hash(body));
        assert_eq!(record.status, HarvestStatus::Success);
        assert!(record.failure_reason.is_none());
    }

    #[test]
    fn failed_record_keeps_reason() {
        let record = HarvestedPdf::failed(
            "https://x.test/a.pdf",
            FailureReason::TooSmall,
            "manual",
            "Title",
            "https://x.test/article",
        );
        assert_eq!(record.status, HarvestStatus::Failed);
        assert_eq!(record.failure_reason, Some(FailureReason::TooSmall));
        assert_eq!(record.file_size, 0);
        assert!(record.filename.is_empty());
    }
}
