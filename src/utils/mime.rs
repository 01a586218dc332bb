//! Content sniffing for downloaded bodies.

/// Strip parameters (`; charset=…`) and lower-case a Content-Type value.
pub fn normalize_content_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or(content_type)
        .trim()
        .to_lowercase()
}

/// Best description of what a body actually is, for rejection logs.
///
/// Magic bytes win; HTML (which `infer` does not detect) is recognised by its
/// leading markup; the declared Content-Type is the last resort.
pub fn describe_body(bytes: &[u8], declared: Option<&str>) -> String {
    if let Some(kind) = infer::get(bytes) {
        return kind.mime_type().to_string();
    }

    let head = String::from_utf8_lossy(&bytes[..bytes.len().min(512)]).to_lowercase();
    let head = head.trim_start();
    if head.starts_with("<!doctype html") || head.starts_with("<html") {
        return "text/html".to_string();
    }

    declared
        .map(normalize_content_type)
        .unwrap_or_else(|| "application/octet-stream".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_content_type() {
        assert_eq!(
            normalize_content_type("Application/PDF; charset=binary"),
            "application/pdf"
        );
    }

    #[test]
    fn test_describe_body() {
        assert_eq!(describe_body(b"%PDF-1.7\n...", None), "application/pdf");
        assert_eq!(
            describe_body(b"  <!DOCTYPE html><html></html>", Some("application/pdf")),
            "text/html"
        );
        assert_eq!(describe_body(b"plain", Some("text/plain; charset=utf-8")), "text/plain");
        assert_eq!(describe_body(b"", None), "application/octet-stream");
    }
}
