//! Page harvest service.
//!
//! Drives one page scan end to end: fetch the page, run every extraction
//! strategy, then download, validate, save, and record each new candidate.
//! Emits no UI output; callers read the returned [`ScanReport`].

mod filename;
mod types;
mod validate;

use std::collections::HashSet;
use std::path::Path;
use std::sync::Mutex;

use chrono::Utc;
use tracing::{debug, info, warn};
use url::Url;

use crate::discovery::{DiscoveryReport, StrategyRegistry};
use crate::http_client::HttpClient;
use crate::models::{HarvestStatus, HarvestedPdf};
use crate::repository::DieselHarvestRepository;
use crate::utils::{describe_body, format_size};

pub use filename::pdf_filename;
pub use types::{HarvestError, HarvestEvent, SavedPdf, ScanReport, ScanRequest, MANUAL_SOURCE};
pub use validate::{validate_pdf, MIN_PDF_SIZE, PDF_MAGIC};

/// Candidates already resolved by this service instance.
#[derive(Default)]
struct SessionSets {
    downloaded: HashSet<String>,
    failed: HashSet<String>,
    /// Claimed by a page scan and not yet resolved.
    in_flight: HashSet<String>,
}

/// Outcome of a detection-only pass.
#[derive(Debug, Default)]
pub struct DetectReport {
    /// Every candidate found on the page.
    pub candidates: Vec<String>,
    /// Candidates newly recorded as `detected`.
    pub recorded: usize,
    pub errors: Vec<HarvestError>,
}

/// Harvests PDFs from publication pages.
///
/// The session sets are owned by this instance; share the service itself
/// (behind an `Arc`) rather than constructing several over one run.
pub struct HarvestService {
    client: HttpClient,
    harvests: DieselHarvestRepository,
    registry: StrategyRegistry,
    min_pdf_size: usize,
    session: Mutex<SessionSets>,
}

impl HarvestService {
    /// Create a service with the built-in strategies.
    pub fn new(client: HttpClient, harvests: DieselHarvestRepository) -> Self {
        Self {
            client,
            harvests,
            registry: StrategyRegistry::default(),
            min_pdf_size: MIN_PDF_SIZE,
            session: Mutex::new(SessionSets::default()),
        }
    }

    pub fn with_registry(mut self, registry: StrategyRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_min_pdf_size(mut self, min_pdf_size: usize) -> Self {
        self.min_pdf_size = min_pdf_size;
        self
    }

    pub fn registry(&self) -> &StrategyRegistry {
        &self.registry
    }

    /// Sizes of the downloaded and failed session sets.
    pub fn session_counts(&self) -> (usize, usize) {
        let session = self.session.lock().unwrap_or_else(|e| e.into_inner());
        (session.downloaded.len(), session.failed.len())
    }

    /// Scan one page as an ad-hoc (`manual`) harvest.
    pub async fn scan(
        &self,
        page_url: &str,
        title: &str,
        download_dir: &Path,
    ) -> Result<ScanReport, HarvestError> {
        self.scan_request(&ScanRequest::new(page_url, title, download_dir))
            .await
    }

    /// Scan one page.
    ///
    /// Fails only when the page itself cannot be fetched; per-candidate
    /// problems are recorded as `failed` and listed in the report.
    pub async fn scan_request(&self, request: &ScanRequest) -> Result<ScanReport, HarvestError> {
        let discovery = self.discover(&request.page_url).await?;

        let mut report = ScanReport {
            page_url: request.page_url.clone(),
            candidates: discovery.candidates.len(),
            strategy_failures: discovery.failures,
            ..Default::default()
        };

        info!(
            "Found {} candidate(s) on {}",
            report.candidates, request.page_url
        );

        for url in discovery.candidates {
            if !self.claim(&url).await {
                debug!("Skipping already resolved {}", url);
                report.skipped += 1;
                continue;
            }

            match self.harvest_candidate(&url, request).await {
                Ok(saved) => {
                    self.mark_downloaded(&url);
                    report.saved.push(saved);
                }
                Err(error) => {
                    warn!("{}", error);
                    self.mark_failed(&url);
                    if let Some(persist_error) = self.record_failure(&url, &error, request).await
                    {
                        report.errors.push(persist_error);
                    }
                    report.errors.push(error);
                }
            }
        }

        Ok(report)
    }

    /// Discover candidates and record them as `detected` without downloading.
    ///
    /// URLs that already have a `success` or `failed` record keep it.
    pub async fn detect(&self, page_url: &str, title: &str) -> Result<DetectReport, HarvestError> {
        let discovery = self.discover(page_url).await?;
        let mut report = DetectReport::default();

        for url in discovery.candidates {
            let existing = self
                .harvests
                .get(&url)
                .await
                .map_err(|source| HarvestError::Persistence {
                    url: url.clone(),
                    source,
                });

            match existing {
                Ok(Some(record)) if record.status != HarvestStatus::Detected => {}
                Ok(_) => {
                    let record = HarvestedPdf::detected(&url, MANUAL_SOURCE, title, page_url);
                    match self.harvests.upsert(&record).await {
                        Ok(()) => report.recorded += 1,
                        Err(source) => report.errors.push(HarvestError::Persistence {
                            url: url.clone(),
                            source,
                        }),
                    }
                }
                Err(error) => report.errors.push(error),
            }

            report.candidates.push(url);
        }

        Ok(report)
    }

    /// Fetch a page and run every strategy over it.
    async fn discover(&self, page_url: &str) -> Result<DiscoveryReport, HarvestError> {
        let requested = Url::parse(page_url).map_err(|source| HarvestError::PageUrl {
            url: page_url.to_string(),
            source,
        })?;

        let response = self.client.get_page(requested.as_str()).await.map_err(|source| {
            HarvestError::PageFetch {
                url: page_url.to_string(),
                source,
            }
        })?;

        if !response.is_success() {
            return Err(HarvestError::PageStatus {
                url: page_url.to_string(),
                status: response.status,
            });
        }

        let base = response.final_url().clone();
        let html = response.text().await.map_err(|source| HarvestError::PageFetch {
            url: page_url.to_string(),
            source,
        })?;

        // Parsed document is dropped inside `discover`
        Ok(self.registry.discover(&html, &base))
    }

    /// Download, validate, save, and record one candidate.
    async fn harvest_candidate(
        &self,
        url: &str,
        request: &ScanRequest,
    ) -> Result<SavedPdf, HarvestError> {
        let response = self
            .client
            .get_document(url)
            .await
            .map_err(|source| HarvestError::Download {
                url: url.to_string(),
                source,
            })?;

        if !response.is_success() {
            return Err(HarvestError::DownloadStatus {
                url: url.to_string(),
                status: response.status,
            });
        }

        let content_type = response.content_type().map(str::to_string);
        let disposition = response.content_disposition_filename();
        let content = response
            .bytes()
            .await
            .map_err(|source| HarvestError::Download {
                url: url.to_string(),
                source,
            })?;

        if let Err(reason) = validate_pdf(&content, self.min_pdf_size) {
            debug!(
                "{} is {} ({})",
                url,
                describe_body(&content, content_type.as_deref()),
                format_size(content.len() as u64)
            );
            return Err(HarvestError::Rejected {
                url: url.to_string(),
                reason,
            });
        }

        let filename = pdf_filename(
            &request.title,
            disposition.as_deref(),
            url,
            Utc::now().timestamp(),
        );
        let path = request.download_dir.join(&filename);
        write_pdf(&path, &content).await?;

        let record = HarvestedPdf::success(
            url,
            &filename,
            &content,
            &request.source_feed,
            &request.title,
            &request.page_url,
        );
        if let Err(source) = self.harvests.upsert(&record).await {
            let _ = tokio::fs::remove_file(&path).await;
            return Err(HarvestError::Persistence {
                url: url.to_string(),
                source,
            });
        }

        info!("Saved {} ({})", filename, format_size(content.len() as u64));

        Ok(SavedPdf {
            url: url.to_string(),
            filename,
            bytes: content.len() as u64,
        })
    }

    /// Upsert a `failed` record. Returns the persistence error, if any.
    async fn record_failure(
        &self,
        url: &str,
        error: &HarvestError,
        request: &ScanRequest,
    ) -> Option<HarvestError> {
        if matches!(error, HarvestError::Persistence { .. }) {
            return None;
        }

        let record = HarvestedPdf::failed(
            url,
            error.failure_reason(),
            &request.source_feed,
            &request.title,
            &request.page_url,
        );
        self.harvests
            .upsert(&record)
            .await
            .err()
            .map(|source| HarvestError::Persistence {
                url: url.to_string(),
                source,
            })
    }

    /// Claim `url` for download by this scan.
    ///
    /// Returns `false` when the session already resolved it, another page
    /// holds it in flight, or the store has a `success` for it. The check
    /// and the claim happen under one lock, so concurrent pages never
    /// download the same URL twice. Stored failures are retried.
    async fn claim(&self, url: &str) -> bool {
        {
            let mut session = self.session.lock().unwrap_or_else(|e| e.into_inner());
            if session.downloaded.contains(url)
                || session.failed.contains(url)
                || session.in_flight.contains(url)
            {
                return false;
            }
            session.in_flight.insert(url.to_string());
        }

        match self.harvests.get(url).await {
            Ok(Some(record)) if record.status == HarvestStatus::Success => {
                // Adopted so later pages skip it without another lookup
                self.mark_downloaded(url);
                false
            }
            Ok(_) => true,
            Err(e) => {
                warn!("Could not check store for {}: {}", url, e);
                true
            }
        }
    }

    fn mark_downloaded(&self, url: &str) {
        let mut session = self.session.lock().unwrap_or_else(|e| e.into_inner());
        session.in_flight.remove(url);
        session.downloaded.insert(url.to_string());
    }

    fn mark_failed(&self, url: &str) {
        let mut session = self.session.lock().unwrap_or_else(|e| e.into_inner());
        session.in_flight.remove(url);
        session.failed.insert(url.to_string());
    }
}

/// Write an accepted PDF, creating the directory as needed.
/// A partially written file is removed.
async fn write_pdf(path: &Path, content: &[u8]) -> Result<(), HarvestError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|source| HarvestError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
    }

    if let Err(source) = tokio::fs::write(path, content).await {
        let _ = tokio::fs::remove_file(path).await;
        return Err(HarvestError::Io {
            path: path.to_path_buf(),
            source,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FailureReason;
    use crate::repository::DieselDbContext;
    use tempfile::tempdir;

    async fn service() -> (HarvestService, DieselHarvestRepository, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let ctx = DieselDbContext::new(&dir.path().join("test.db"));
        ctx.init_schema().await.unwrap();
        let service = HarvestService::new(HttpClient::new().unwrap(), ctx.harvests());
        (service, ctx.harvests(), dir)
    }

    #[tokio::test]
    async fn test_invalid_page_url_fails_without_record() {
        let (service, repo, dir) = service().await;
        let err = service
            .scan("not a url", "T", dir.path())
            .await
            .unwrap_err();
        assert!(matches!(err, HarvestError::PageUrl { .. }));
        assert_eq!(err.url(), Some("not a url"));
        assert!(repo.list(&Default::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_stored_success_counts_as_resolved() {
        let (service, repo, _dir) = service().await;
        let record = HarvestedPdf::success(
            "https://x.test/a.pdf",
            "a.pdf",
            b"%PDF-1.4",
            "Air",
            "Guide",
            "https://x.test/guide",
        );
        repo.upsert(&record).await.unwrap();

        assert!(!service.claim("https://x.test/a.pdf").await);
        assert_eq!(service.session_counts(), (1, 0));
        assert!(service.claim("https://x.test/b.pdf").await);
    }

    #[tokio::test]
    async fn test_stored_failure_is_retried() {
        let (service, repo, _dir) = service().await;
        let record = HarvestedPdf::failed(
            "https://x.test/a.pdf",
            FailureReason::TooSmall,
            "Air",
            "Guide",
            "https://x.test/guide",
        );
        repo.upsert(&record).await.unwrap();
        assert!(service.claim("https://x.test/a.pdf").await);
    }

    #[tokio::test]
    async fn test_in_flight_url_cannot_be_claimed_twice() {
        let (service, _repo, _dir) = service().await;
        let url = "https://x.test/shared.pdf";

        assert!(service.claim(url).await);
        assert!(!service.claim(url).await);

        service.mark_downloaded(url);
        assert!(!service.claim(url).await);
        assert_eq!(service.session_counts(), (1, 0));
    }

    #[test]
    fn test_failure_reason_mapping() {
        let rejected = HarvestError::Rejected {
            url: "u".into(),
            reason: FailureReason::SignatureMismatch,
        };
        assert_eq!(rejected.failure_reason(), FailureReason::SignatureMismatch);

        let io = HarvestError::Io {
            path: "/x".into(),
            source: std::io::Error::other("disk full"),
        };
        assert_eq!(io.failure_reason(), FailureReason::WriteError);
        assert_eq!(io.url(), None);
    }

    #[tokio::test]
    async fn test_write_pdf_creates_directories() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a").join("b").join("doc.pdf");
        write_pdf(&path, b"%PDF").await.unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"%PDF");
    }
}
