use serde_json::Value;
use tracing::warn;

use crate::discovery::{CandidateSet, ExtractionError, ExtractionStrategy, Page};

/// String leaves mentioning `.pdf` anywhere inside JSON-LD blocks.
///
/// Blocks are parsed independently. A malformed block is skipped with a
/// warning when other blocks parse; the strategy fails only when every
/// non-empty block is malformed.
pub struct JsonLdStrategy;

impl ExtractionStrategy for JsonLdStrategy {
    fn name(&self) -> &'static str {
        "json_ld"
    }

    fn extract(&self, page: &Page) -> Result<CandidateSet, ExtractionError> {
        let mut found = CandidateSet::new();
        let mut parsed_any = false;
        let mut first_error = None;

        for script in page.select(r#"script[type="application/ld+json"]"#)? {
            let body: String = script.text().collect();
            let body = body.trim();
            if body.is_empty() {
                continue;
            }
            let parsed: Value = match serde_json::from_str(body) {
                Ok(parsed) => parsed,
                Err(e) => {
                    warn!("Skipping malformed JSON-LD block on {}: {}", page.base_url(), e);
                    first_error.get_or_insert(e);
                    continue;
                }
            };
            parsed_any = true;
            walk(&parsed, &mut |leaf| {
                if leaf.to_ascii_lowercase().contains(".pdf") {
                    if let Some(url) = page.resolve(leaf) {
                        found.insert(url);
                    }
                }
            });
        }

        match first_error {
            Some(e) if !parsed_any => Err(e.into()),
            _ => Ok(found),
        }
    }
}

fn walk(value: &Value, visit: &mut impl FnMut(&str)) {
    match value {
        Value::String(s) => visit(s),
        Value::Object(map) => map.values().for_each(|v| walk(v, visit)),
        Value::Array(items) => items.iter().for_each(|v| walk(v, visit)),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::strategies::test_support::{run, BASE};
    use url::Url;

    #[test]
    fn test_nested_leaves() {
        let found = run(
            &JsonLdStrategy,
            r#"<script type="application/ld+json">
               {"@type": "Book", "name": "Guide",
                "workExample": [{"encoding": {"contentUrl": "/docs/guide.pdf"}}],
                "url": "https://librairie.ademe.fr/air/123-guide.html"}
               </script>
               <script type="application/ld+json"></script>"#,
        );
        assert_eq!(
            found.into_iter().collect::<Vec<_>>(),
            vec!["https://librairie.ademe.fr/docs/guide.pdf"]
        );
    }

    #[test]
    fn test_malformed_block_keeps_valid_blocks() {
        let found = run(
            &JsonLdStrategy,
            r#"<script type="application/ld+json">{"url": </script>
               <script type="application/ld+json">{"contentUrl": "/docs/rapport.pdf"}</script>"#,
        );
        assert_eq!(
            found.into_iter().collect::<Vec<_>>(),
            vec!["https://librairie.ademe.fr/docs/rapport.pdf"]
        );
    }

    #[test]
    fn test_malformed_block_fails() {
        let page = Page::parse(
            r#"<script type="application/ld+json">{"url": </script>"#,
            Url::parse(BASE).unwrap(),
        );
        assert!(matches!(
            JsonLdStrategy.extract(&page),
            Err(ExtractionError::Json(_))
        ));
    }
}
