//! On-disk names for saved PDFs. Best-effort: collisions are possible.

use url::Url;

use crate::utils::sanitize_title;

/// Longest stem kept from a title or suggested name, in bytes. Leaves room
/// for the timestamp and extension under the usual 255-byte name limit.
const MAX_STEM_BYTES: usize = 150;

/// `{title}_{unix seconds}.pdf`, else the server-suggested name, else the
/// URL's last path segment, else `document_{unix seconds}.pdf`.
pub fn pdf_filename(
    title: &str,
    disposition: Option<&str>,
    url: &str,
    unix_secs: i64,
) -> String {
    let title = cap_bytes(&sanitize_title(title));
    if !title.is_empty() {
        return format!("{}_{}.pdf", title, unix_secs);
    }

    if let Some(name) = disposition.and_then(usable_name) {
        return name;
    }

    let basename = Url::parse(url).ok().and_then(|parsed| {
        let last = parsed.path_segments()?.next_back()?.to_string();
        let decoded = urlencoding::decode(&last).ok()?.into_owned();
        usable_name(&decoded)
    });
    if let Some(name) = basename {
        return name;
    }

    format!("document_{}.pdf", unix_secs)
}

/// Sanitized name with a `.pdf` extension, if anything survives.
fn usable_name(raw: &str) -> Option<String> {
    let name = sanitize_title(raw);
    if name.is_empty() || name == "." || name == ".." {
        return None;
    }
    let (stem, ext) = if name.to_ascii_lowercase().ends_with(".pdf") {
        name.split_at(name.len() - 4)
    } else {
        (name.as_str(), ".pdf")
    };
    let stem = cap_bytes(stem);
    if stem.is_empty() {
        return None;
    }
    Some(format!("{}{}", stem, ext))
}

/// At most [`MAX_STEM_BYTES`] bytes, cut on a char boundary.
fn cap_bytes(s: &str) -> String {
    if s.len() <= MAX_STEM_BYTES {
        return s.to_string();
    }
    let mut end = MAX_STEM_BYTES;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    s[..end].trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_with_token() {
        assert_eq!(
            pdf_filename("Guide: qualité de l'air", None, "https://x.test/a.pdf", 1700000000),
            "Guide qualité de lair_1700000000.pdf"
        );
    }

    #[test]
    fn test_url_basename_fallback() {
        assert_eq!(
            pdf_filename("", None, "https://x.test/docs/rapport%20final.pdf", 1),
            "rapport final.pdf"
        );
    }

    #[test]
    fn test_disposition_before_basename() {
        assert_eq!(
            pdf_filename("", Some("Rapport 2024"), "https://x.test/dl/a.pdf", 1),
            "Rapport 2024.pdf"
        );
    }

    #[test]
    fn test_generic_fallback() {
        assert_eq!(
            pdf_filename("?!", None, "https://x.test/", 42),
            "document_42.pdf"
        );
        assert_eq!(pdf_filename("", None, "not a url", 7), "document_7.pdf");
    }

    #[test]
    fn test_long_title_is_capped() {
        let title = "Économie circulaire et déchets ".repeat(20);
        let name = pdf_filename(&title, None, "https://x.test/a.pdf", 1700000000);
        assert!(name.len() <= MAX_STEM_BYTES + "_1700000000.pdf".len());
        assert!(name.ends_with("_1700000000.pdf"));
        assert!(name.starts_with("Économie circulaire"));
    }

    #[test]
    fn test_long_basename_keeps_extension() {
        let url = format!("https://x.test/{}.pdf", "é".repeat(200));
        let name = pdf_filename("", None, &url, 1);
        assert!(name.len() <= MAX_STEM_BYTES + 4);
        assert!(name.ends_with(".pdf"));
    }

    #[test]
    fn test_controller_basename_gets_extension() {
        assert_eq!(
            pdf_filename(
                "",
                None,
                "https://x.test/index.php?controller=attachment&id_attachment=3",
                1
            ),
            "index.php.pdf"
        );
    }
}
