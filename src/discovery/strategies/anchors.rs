use crate::discovery::classify::{is_attachment_controller, is_pdf_url};
use crate::discovery::{CandidateSet, ExtractionError, ExtractionStrategy, Page};

/// `<a href>` targets that look like PDFs or attachment downloads.
pub struct AnchorStrategy;

impl ExtractionStrategy for AnchorStrategy {
    fn name(&self) -> &'static str {
        "anchors"
    }

    fn extract(&self, page: &Page) -> Result<CandidateSet, ExtractionError> {
        let mut found = CandidateSet::new();

        for anchor in page.select("a[href]")? {
            let Some(href) = anchor.value().attr("href") else {
                continue;
            };
            let href = href.trim();
            if href.is_empty() {
                continue;
            }
            if is_attachment_controller(href) || is_pdf_url(href) {
                if let Some(url) = page.resolve(href) {
                    found.insert(url);
                }
            }
        }

        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::strategies::test_support::run;

    #[test]
    fn test_relative_pdf_link() {
        let found = run(&AnchorStrategy, r#"<a href="/docs/report.pdf">Rapport</a>"#);
        assert_eq!(
            found.into_iter().collect::<Vec<_>>(),
            vec!["https://librairie.ademe.fr/docs/report.pdf"]
        );
    }

    #[test]
    fn test_attachment_link() {
        let found = run(
            &AnchorStrategy,
            r#"<a href="index.php?controller=attachment&amp;id_attachment=9">Télécharger</a>"#,
        );
        assert!(found.contains(
            "https://librairie.ademe.fr/air/index.php?controller=attachment&id_attachment=9"
        ));
    }

    #[test]
    fn test_ignores_other_links() {
        let found = run(
            &AnchorStrategy,
            r#"<a href="/contact.html">c</a><a href="  ">blank</a><a>none</a>"#,
        );
        assert!(found.is_empty());
    }
}
