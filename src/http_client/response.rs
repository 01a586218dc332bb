//! HTTP response wrapper.

use std::collections::HashMap;

use reqwest::{Response, StatusCode};

/// Response with headers captured up front so the body can be consumed later.
pub struct HttpResponse {
    pub status: StatusCode,
    pub headers: HashMap<String, String>,
    pub(crate) response: Response,
}

impl HttpResponse {
    pub(crate) fn new(response: Response) -> Self {
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        Self {
            status: response.status(),
            headers,
            response,
        }
    }

    /// Check if the response is successful.
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// URL the response came from, after redirects.
    pub fn final_url(&self) -> &reqwest::Url {
        self.response.url()
    }

    /// Get the Content-Type header.
    pub fn content_type(&self) -> Option<&str> {
        self.headers.get("content-type").map(|s| s.as_str())
    }

    /// Get the filename from the Content-Disposition header.
    pub fn content_disposition_filename(&self) -> Option<String> {
        self.headers
            .get("content-disposition")
            .and_then(|h| parse_content_disposition_filename(h))
    }

    /// Get response body as bytes.
    pub async fn bytes(self) -> Result<Vec<u8>, reqwest::Error> {
        self.response.bytes().await.map(|b| b.to_vec())
    }

    /// Get response body as text.
    pub async fn text(self) -> Result<String, reqwest::Error> {
        self.response.text().await
    }
}

/// Parse the filename from a Content-Disposition header value.
///
/// `filename*=UTF-8''…` (RFC 5987) wins over plain `filename=`.
pub fn parse_content_disposition_filename(header: &str) -> Option<String> {
    let mut plain = None;
    for part in header.split(';').map(str::trim) {
        if let Some(encoded) = part.strip_prefix("filename*=") {
            let value = encoded.split_once("''").map_or(encoded, |(_, v)| v);
            if let Ok(decoded) = urlencoding::decode(value.trim_matches('"')) {
                let name = decoded.trim();
                if !name.is_empty() {
                    return Some(name.to_string());
                }
            }
        } else if let Some(value) = part.strip_prefix("filename=") {
            let name = value.trim().trim_matches('"').trim();
            if !name.is_empty() {
                plain = Some(name.to_string());
            }
        }
    }
    plain
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_content_disposition_quoted() {
        let header = r#"attachment; filename="guide-qualite-air.pdf""#;
        assert_eq!(
            parse_content_disposition_filename(header),
            Some("guide-qualite-air.pdf".to_string())
        );
    }

    #[test]
    fn test_parse_content_disposition_unquoted() {
        assert_eq!(
            parse_content_disposition_filename("attachment; filename=rapport.pdf"),
            Some("rapport.pdf".to_string())
        );
    }

    #[test]
    fn test_parse_content_disposition_encoded_wins() {
        let header = r#"attachment; filename="fallback.pdf"; filename*=UTF-8''%C3%A9nergie%202025.pdf"#;
        assert_eq!(
            parse_content_disposition_filename(header),
            Some("énergie 2025.pdf".to_string())
        );
    }

    #[test]
    fn test_parse_content_disposition_none() {
        assert_eq!(parse_content_disposition_filename("attachment"), None);
        assert_eq!(parse_content_disposition_filename("inline; filename=\"\""), None);
    }
}
