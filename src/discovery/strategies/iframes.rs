use crate::discovery::{CandidateSet, ExtractionError, ExtractionStrategy, Page};

/// Embedded viewers: `<iframe src>` mentioning `.pdf`.
pub struct IframeStrategy;

impl ExtractionStrategy for IframeStrategy {
    fn name(&self) -> &'static str {
        "iframes"
    }

    fn extract(&self, page: &Page) -> Result<CandidateSet, ExtractionError> {
        Ok(page
            .select("iframe[src]")?
            .into_iter()
            .filter_map(|iframe| iframe.value().attr("src"))
            .filter(|src| src.to_ascii_lowercase().contains(".pdf"))
            .filter_map(|src| page.resolve(src))
            .collect())
    }
}
