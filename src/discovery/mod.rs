//! PDF discovery over a parsed publication page.
//!
//! Each [`ExtractionStrategy`] scans one kind of source material (anchors,
//! scripts, meta tags, …) and returns absolute candidate URLs. Strategies are
//! independent; the registry unions their outputs, so the same URL found by
//! several strategies appears once.

pub mod classify;
pub mod strategies;

use std::collections::BTreeSet;
use std::sync::Arc;

use scraper::{ElementRef, Html, Selector};
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

pub use classify::{attachment_url, is_attachment_controller, is_pdf_url};

/// Absolute candidate URLs, ordered for deterministic processing.
pub type CandidateSet = BTreeSet<String>;

/// Failure of a single strategy. Never aborts a page scan.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("invalid selector {selector}: {message}")]
    Selector {
        selector: &'static str,
        message: String,
    },

    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

/// A fetched page, parsed once and shared read-only by every strategy.
pub struct Page {
    document: Html,
    base_url: Url,
}

impl Page {
    pub fn parse(html: &str, base_url: Url) -> Self {
        Self {
            document: Html::parse_document(html),
            base_url,
        }
    }

    pub fn document(&self) -> &Html {
        &self.document
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Join a raw value against the page URL.
    ///
    /// Only http(s) results are kept; anything else (`mailto:`,
    /// `javascript:`, unjoinable garbage) yields `None`.
    pub fn resolve(&self, raw: &str) -> Option<String> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        let joined = self.base_url.join(raw).ok()?;
        matches!(joined.scheme(), "http" | "https").then(|| joined.into())
    }

    /// Elements matching a static CSS selector.
    pub fn select(
        &self,
        css: &'static str,
    ) -> Result<Vec<ElementRef<'_>>, ExtractionError> {
        let selector = Selector::parse(css).map_err(|e| ExtractionError::Selector {
            selector: css,
            message: format!("{:?}", e),
        })?;
        Ok(self.document.select(&selector).collect())
    }

    /// Text content of every `<script>` element.
    pub fn script_texts(&self) -> Result<Vec<String>, ExtractionError> {
        Ok(self
            .select("script")?
            .into_iter()
            .map(|script| script.text().collect::<String>())
            .filter(|text| !text.trim().is_empty())
            .collect())
    }
}

/// One independent candidate-extraction pass over a page.
pub trait ExtractionStrategy: Send + Sync {
    /// Short identifier used in logs and reports.
    fn name(&self) -> &'static str;

    /// Collect absolute candidate URLs from the page.
    fn extract(&self, page: &Page) -> Result<CandidateSet, ExtractionError>;
}

/// A strategy that failed on a page.
#[derive(Debug)]
pub struct StrategyFailure {
    pub strategy: &'static str,
    pub error: ExtractionError,
}

/// Union of all strategies' candidates, plus per-strategy failures.
#[derive(Debug, Default)]
pub struct DiscoveryReport {
    pub candidates: CandidateSet,
    pub failures: Vec<StrategyFailure>,
}

/// Ordered set of strategies run against every page.
#[derive(Clone)]
pub struct StrategyRegistry {
    strategies: Vec<Arc<dyn ExtractionStrategy>>,
}

impl StrategyRegistry {
    /// Registry with no strategies.
    pub fn empty() -> Self {
        Self {
            strategies: Vec::new(),
        }
    }

    /// Append a strategy.
    pub fn register(&mut self, strategy: Arc<dyn ExtractionStrategy>) {
        self.strategies.push(strategy);
    }

    /// Names of the registered strategies, in run order.
    pub fn names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Run every strategy and union the results.
    ///
    /// A failing strategy contributes nothing; its error is recorded in the
    /// report and the remaining strategies still run. Strategies that match
    /// on a loose `.pdf` substring are filtered through [`is_pdf_url`] here.
    pub fn run(&self, page: &Page) -> DiscoveryReport {
        let mut report = DiscoveryReport::default();

        for strategy in &self.strategies {
            match strategy.extract(page) {
                Ok(found) => {
                    let total = found.len();
                    let accepted: Vec<String> =
                        found.into_iter().filter(|url| is_pdf_url(url)).collect();
                    debug!(
                        "{} found {} candidate(s) on {} ({} not PDF URLs)",
                        strategy.name(),
                        accepted.len(),
                        page.base_url(),
                        total - accepted.len()
                    );
                    report.candidates.extend(accepted);
                }
                Err(error) => {
                    warn!(
                        "Strategy {} failed on {}: {}",
                        strategy.name(),
                        page.base_url(),
                        error
                    );
                    report.failures.push(StrategyFailure {
                        strategy: strategy.name(),
                        error,
                    });
                }
            }
        }

        report
    }

    /// Parse `html` against `base_url` and run every strategy.
    ///
    /// The parsed document is dropped before returning, so callers can hold
    /// the report across `.await` points.
    pub fn discover(&self, html: &str, base_url: &Url) -> DiscoveryReport {
        let page = Page::parse(html, base_url.clone());
        self.run(&page)
    }
}

impl Default for StrategyRegistry {
    /// All built-in strategies.
    fn default() -> Self {
        let mut registry = Self::empty();
        for strategy in strategies::builtin() {
            registry.register(strategy);
        }
        registry
    }
}

/// Run the built-in strategies over `html`.
pub fn discover_candidates(html: &str, base_url: &Url) -> DiscoveryReport {
    StrategyRegistry::default().discover(html, base_url)
}
