use std::sync::LazyLock;

use regex::Regex;

use crate::discovery::classify::attachment_url;
use crate::discovery::{CandidateSet, ExtractionError, ExtractionStrategy, Page};

static JSON_ATTACHMENT_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"id_attachment"\s*:\s*(\d+)"#).expect("attachment id regex should compile")
});

static QUERY_ATTACHMENT_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"id_attachment=\s*(\d+)").expect("attachment query regex should compile")
});

/// Attachment ids in storefront scripts that mention `attachments`.
pub struct PlatformScriptStrategy;

impl ExtractionStrategy for PlatformScriptStrategy {
    fn name(&self) -> &'static str {
        "platform_scripts"
    }

    fn extract(&self, page: &Page) -> Result<CandidateSet, ExtractionError> {
        let mut found = CandidateSet::new();

        for text in page.script_texts()? {
            if !text.contains("attachments") {
                continue;
            }
            for pattern in [&*JSON_ATTACHMENT_ID, &*QUERY_ATTACHMENT_ID] {
                for captures in pattern.captures_iter(&text) {
                    if let Some(url) = captures
                        .get(1)
                        .and_then(|id| attachment_url(page.base_url(), id.as_str()))
                    {
                        found.insert(url);
                    }
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
    fn test_product_json() {
        let found = run(
            &PlatformScriptStrategy,
            r#"<script>var prestashop = {"product": {"attachments": [{"id_attachment": "x"}, {"id_attachment": 1375}]}};
               var link = "index.php?controller=attachment&id_attachment=12";</script>"#,
        );
        assert_eq!(
            found.into_iter().collect::<Vec<_>>(),
            vec![
                "https://librairie.ademe.fr/index.php?controller=attachment&id_attachment=12",
                "https://librairie.ademe.fr/index.php?controller=attachment&id_attachment=1375",
            ]
        );
    }

    #[test]
    fn test_requires_attachments_keyword() {
        let found = run(
            &PlatformScriptStrategy,
            r#"<script>var a = {"id_attachment": 5};</script>"#,
        );
        assert!(found.is_empty());
    }
}
