use serde_json::Value;

use crate::discovery::classify::{attachment_url, is_pdf_url};
use crate::discovery::{CandidateSet, ExtractionError, ExtractionStrategy, Page};

/// Attributes whose value is a whitespace-separated token list.
const MULTI_VALUED: &[&str] = &[
    "class",
    "rel",
    "rev",
    "accept-charset",
    "headers",
    "accesskey",
    "dropzone",
];

/// Every attribute of every element: URL-shaped PDF values, plus
/// JSON-object values carrying an `attachments` list.
pub struct AttributeStrategy;

impl ExtractionStrategy for AttributeStrategy {
    fn name(&self) -> &'static str {
        "attributes"
    }

    fn extract(&self, page: &Page) -> Result<CandidateSet, ExtractionError> {
        let mut found = CandidateSet::new();

        for element in page.select("*")? {
            for (name, value) in element.value().attrs() {
                if MULTI_VALUED.contains(&name) {
                    for token in value.split_whitespace() {
                        collect_value(page, token, &mut found);
                    }
                } else {
                    collect_value(page, value, &mut found);
                }
            }
        }

        Ok(found)
    }
}

fn collect_value(page: &Page, value: &str, found: &mut CandidateSet) {
    let value = value.trim();

    if (value.starts_with("http") || value.starts_with('/')) && is_pdf_url(value) {
        if let Some(url) = page.resolve(value) {
            found.insert(url);
        }
    }

    if value.starts_with('{') && value.ends_with('}') {
        // Not every brace-delimited attribute is JSON
        if let Ok(parsed) = serde_json::from_str::<Value>(value) {
            for id in attachment_ids(&parsed) {
                if let Some(url) = attachment_url(page.base_url(), &id) {
                    found.insert(url);
                }
            }
        }
    }
}

/// Ids from `{"attachments": [{"id_attachment": ..} | {"id": ..}]}`.
fn attachment_ids(parsed: &Value) -> Vec<String> {
    let Some(attachments) = parsed.get("attachments").and_then(Value::as_array) else {
        return Vec::new();
    };

    attachments
        .iter()
        .filter_map(|attachment| {
            let by_key = |key: &str| attachment.get(key).and_then(truthy_id);
            by_key("id_attachment").or_else(|| by_key("id"))
        })
        .collect()
}

fn truthy_id(value: &Value) -> Option<String> {
    match value {
        Value::Number(n) if n.as_f64() != Some(0.0) => Some(n.to_string()),
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::strategies::test_support::run;

    #[test]
    fn test_data_attribute_with_attachments() {
        let found = run(
            &AttributeStrategy,
            r#"<div data-att='{"attachments":[{"id_attachment":42}]}'></div>"#,
        );
        assert_eq!(
            found.into_iter().collect::<Vec<_>>(),
            vec!["https://librairie.ademe.fr/index.php?controller=attachment&id_attachment=42"]
        );
    }

    #[test]
    fn test_id_fallback_and_falsy_ids() {
        let found = run(
            &AttributeStrategy,
            r#"<div data-x='{"attachments":[{"id":"7"},{"id_attachment":0},{"id":""},{}]}'></div>"#,
        );
        assert_eq!(found.len(), 1);
        assert!(found.contains("https://librairie.ademe.fr/index.php?controller=attachment&id_attachment=7"));
    }

    #[test]
    fn test_url_shaped_attributes() {
        let found = run(
            &AttributeStrategy,
            r#"<button data-href="/files/a.pdf">a</button>
               <span data-file="b.pdf">relative without slash</span>
               <div class="btn https://x.test/c.pdf"></div>
               <img src="/img/cover.png">"#,
        );
        assert!(found.contains("https://librairie.ademe.fr/files/a.pdf"));
        assert!(found.contains("https://x.test/c.pdf"));
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn test_malformed_json_is_ignored() {
        let found = run(&AttributeStrategy, r#"<div data-x='{attachments: [1}'></div>"#);
        assert!(found.is_empty());
    }
}
