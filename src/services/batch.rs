//! Batch ("scan all") service.
//!
//! Runs a bounded pool of workers over a queue of feed articles, each worker
//! scanning one page at a time through a shared [`HarvestService`]. Progress
//! goes out as [`HarvestEvent`]s; a closed channel never stops the work.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tracing::{error, info};

use super::harvest::{HarvestEvent, HarvestService, ScanRequest};
use crate::models::FeedArticle;
use crate::utils::sanitize_dir_name;

/// Totals for a batch run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BatchResult {
    /// Pages scanned successfully.
    pub pages: usize,
    /// PDFs newly saved across all pages.
    pub pdfs: usize,
    /// Pages whose fetch failed.
    pub failed_pages: usize,
}

/// Scans many article pages with a bounded worker pool.
pub struct BatchService {
    harvester: Arc<HarvestService>,
    download_root: PathBuf,
    cancelled: Arc<AtomicBool>,
}

impl BatchService {
    pub fn new(harvester: Arc<HarvestService>, download_root: PathBuf) -> Self {
        Self {
            harvester,
            download_root,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Flag that stops workers from taking new pages. In-flight pages finish.
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        self.cancelled.clone()
    }

    /// Directory a theme's PDFs are saved under.
    pub fn theme_dir(&self, theme: &str) -> PathBuf {
        self.download_root.join(sanitize_dir_name(theme, "ademe"))
    }

    /// Scan every article with at most `workers` pages in flight.
    pub async fn scan_all(
        &self,
        articles: Vec<FeedArticle>,
        workers: usize,
        event_tx: mpsc::Sender<HarvestEvent>,
    ) -> BatchResult {
        let queue = Arc::new(Mutex::new(VecDeque::from(articles)));
        let pages = Arc::new(AtomicUsize::new(0));
        let pdfs = Arc::new(AtomicUsize::new(0));
        let failed_pages = Arc::new(AtomicUsize::new(0));

        let workers = workers.max(1);
        let mut handles = Vec::with_capacity(workers);

        for worker_id in 0..workers {
            let queue = queue.clone();
            let harvester = self.harvester.clone();
            let download_root = self.download_root.clone();
            let cancelled = self.cancelled.clone();
            let pages = pages.clone();
            let pdfs = pdfs.clone();
            let failed_pages = failed_pages.clone();
            let event_tx = event_tx.clone();

            let handle = tokio::spawn(async move {
                loop {
                    if cancelled.load(Ordering::Relaxed) {
                        break;
                    }

                    let next = queue
                        .lock()
                        .unwrap_or_else(|e| e.into_inner())
                        .pop_front();
                    let Some(article) = next else {
                        break;
                    };

                    let _ = event_tx
                        .send(HarvestEvent::PageStarted {
                            worker_id,
                            page_url: article.link.clone(),
                            title: article.title.clone(),
                        })
                        .await;

                    let request = ScanRequest::new(
                        &article.link,
                        &article.title,
                        download_root.join(sanitize_dir_name(&article.theme, "ademe")),
                    )
                    .with_source_feed(&article.theme);

                    let report = match harvester.scan_request(&request).await {
                        Ok(report) => report,
                        Err(e) => {
                            failed_pages.fetch_add(1, Ordering::Relaxed);
                            let _ = event_tx
                                .send(HarvestEvent::PageFailed {
                                    worker_id,
                                    page_url: article.link.clone(),
                                    error: e.to_string(),
                                })
                                .await;
                            continue;
                        }
                    };

                    for saved in &report.saved {
                        let _ = event_tx
                            .send(HarvestEvent::PdfSaved {
                                worker_id,
                                url: saved.url.clone(),
                                filename: saved.filename.clone(),
                                bytes: saved.bytes,
                            })
                            .await;
                    }
                    for error in &report.errors {
                        let _ = event_tx
                            .send(HarvestEvent::PdfRejected {
                                worker_id,
                                url: error.url().unwrap_or_default().to_string(),
                                error: error.to_string(),
                            })
                            .await;
                    }

                    pages.fetch_add(1, Ordering::Relaxed);
                    pdfs.fetch_add(report.saved.len(), Ordering::Relaxed);

                    let _ = event_tx
                        .send(HarvestEvent::PageFinished {
                            worker_id,
                            page_url: article.link.clone(),
                            new_pdfs: report.saved.len(),
                        })
                        .await;
                }
            });

            handles.push(handle);
        }

        for handle in handles {
            if let Err(e) = handle.await {
                error!("Batch worker panicked: {}", e);
            }
        }

        let result = BatchResult {
            pages: pages.load(Ordering::Relaxed),
            pdfs: pdfs.load(Ordering::Relaxed),
            failed_pages: failed_pages.load(Ordering::Relaxed),
        };
        info!(
            "Batch finished: {} page(s), {} new PDF(s), {} failed page(s)",
            result.pages, result.pdfs, result.failed_pages
        );
        result
    }
}
