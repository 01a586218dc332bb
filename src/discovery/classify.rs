//! Decide whether a candidate URL denotes a PDF resource.
//!
//! Publication platforms often serve PDFs from download-controller endpoints
//! with no file extension, so extension and controller signals are both
//! first-class.

use url::Url;

/// Query marker of the storefront attachment controller.
pub const ATTACHMENT_CONTROLLER: &str = "controller=attachment";

/// Query marker carrying the numeric attachment id.
pub const ATTACHMENT_ID_PARAM: &str = "id_attachment=";

/// Check for the attachment-controller convention
/// (`controller=attachment` together with `id_attachment=`).
pub fn is_attachment_controller(candidate: &str) -> bool {
    candidate.contains(ATTACHMENT_CONTROLLER) && candidate.contains(ATTACHMENT_ID_PARAM)
}

/// Classify a candidate URL, absolute or relative. First match wins:
/// 1. attachment-controller pattern
/// 2. path ends in `.pdf` (case-insensitive)
/// 3. query string contains `.pdf` (case-insensitive)
pub fn is_pdf_url(candidate: &str) -> bool {
    let candidate = candidate.trim();
    if candidate.is_empty() {
        return false;
    }
    if is_attachment_controller(candidate) {
        return true;
    }

    let (path, query) = split_path_query(candidate);
    if path.to_ascii_lowercase().ends_with(".pdf") {
        return true;
    }
    query.is_some_and(|q| q.to_ascii_lowercase().contains(".pdf"))
}

/// Path and query components, fragment discarded.
fn split_path_query(candidate: &str) -> (String, Option<String>) {
    if let Ok(parsed) = Url::parse(candidate) {
        return (parsed.path().to_string(), parsed.query().map(str::to_string));
    }

    let without_fragment = candidate.split('#').next().unwrap_or_default();
    match without_fragment.split_once('?') {
        Some((path, query)) => (path.to_string(), Some(query.to_string())),
        None => (without_fragment.to_string(), None),
    }
}

/// Attachment-controller URL for a numeric attachment id, relative to `base`.
pub fn attachment_url(base: &Url, id: &str) -> Option<String> {
    base.join(&format!(
        "/index.php?{}&{}{}",
        ATTACHMENT_CONTROLLER, ATTACHMENT_ID_PARAM, id
    ))
    .ok()
    .map(String::from)
}
