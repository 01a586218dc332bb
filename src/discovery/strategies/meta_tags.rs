use crate::discovery::{CandidateSet, ExtractionError, ExtractionStrategy, Page};

/// `<meta content>` values mentioning `.pdf`.
pub struct MetaTagStrategy;

impl ExtractionStrategy for MetaTagStrategy {
    fn name(&self) -> &'static str {
        "meta_tags"
    }

    fn extract(&self, page: &Page) -> Result<CandidateSet, ExtractionError> {
        Ok(page
            .select("meta[content]")?
            .into_iter()
            .filter_map(|meta| meta.value().attr("content"))
            .filter(|content| content.to_ascii_lowercase().contains(".pdf"))
            .filter_map(|content| page.resolve(content))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::strategies::test_support::run;

    #[test]
    fn test_citation_pdf_url() {
        let found = run(
            &MetaTagStrategy,
            r#"<head><meta name="citation_pdf_url" content="/media/guide.pdf">
               <meta name="description" content="Un guide"></head>"#,
        );
        assert_eq!(
            found.into_iter().collect::<Vec<_>>(),
            vec!["https://librairie.ademe.fr/media/guide.pdf"]
        );
    }
}
