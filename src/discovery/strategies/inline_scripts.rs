use std::sync::LazyLock;

use regex::Regex;

use crate::discovery::{CandidateSet, ExtractionError, ExtractionStrategy, Page};

/// Quoted absolute URL containing `.pdf`.
static QUOTED_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)["'](https?://[^"']+?\.pdf[^"']*)["']"#)
        .expect("quoted pdf url regex should compile")
});

/// Bare absolute URL containing `.pdf`.
static BARE_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(https?://[^\s<>"']+?\.pdf[^\s<>"']*)"#)
        .expect("bare pdf url regex should compile")
});

/// `pdfUrl = "..."` / `pdfUrl: '...'` assignments.
static PDF_URL_ASSIGNMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)pdfUrl[=:]\s*["']([^"']+\.pdf[^"']*)["']"#)
        .expect("pdfUrl assignment regex should compile")
});

/// `download... = "..."` assignments.
static DOWNLOAD_ASSIGNMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)download[^=]*=\s*["']([^"']+?\.pdf[^"']*)["']"#)
        .expect("download assignment regex should compile")
});

/// PDF references embedded in inline JavaScript.
pub struct InlineScriptStrategy;

impl ExtractionStrategy for InlineScriptStrategy {
    fn name(&self) -> &'static str {
        "inline_scripts"
    }

    fn extract(&self, page: &Page) -> Result<CandidateSet, ExtractionError> {
        let mut found = CandidateSet::new();

        for text in page.script_texts()? {
            for pattern in [
                &*QUOTED_URL,
                &*BARE_URL,
                &*PDF_URL_ASSIGNMENT,
                &*DOWNLOAD_ASSIGNMENT,
            ] {
                for captures in pattern.captures_iter(&text) {
                    if let Some(url) = captures.get(1).and_then(|m| page.resolve(m.as_str())) {
                        found.insert(url);
                    }
                }
            }
        }

        Ok(found)
    }
}
