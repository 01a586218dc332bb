//! Magic-byte and size check for downloaded bodies.

use crate::models::FailureReason;

/// Leading bytes of every PDF file.
pub const PDF_MAGIC: &[u8] = b"%PDF";

/// Smallest body accepted as a real document. Error pages and redirect
/// stubs that slip past the URL filter are usually well below this.
pub const MIN_PDF_SIZE: usize = 1000;

/// Accept `bytes` iff they start with `%PDF` and are at least `min_size` long.
pub fn validate_pdf(bytes: &[u8], min_size: usize) -> Result<(), FailureReason> {
    if !bytes.starts_with(PDF_MAGIC) {
        return Err(FailureReason::SignatureMismatch);
    }
    if bytes.len() < min_size {
        return Err(FailureReason::TooSmall);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pdf_of_len(len: usize) -> Vec<u8> {
        let mut body = PDF_MAGIC.to_vec();
        body.resize(len, b' ');
        body
    }

    #[test]
    fn test_accepts_large_pdf() {
        assert_eq!(validate_pdf(&pdf_of_len(MIN_PDF_SIZE), MIN_PDF_SIZE), Ok(()));
        assert_eq!(validate_pdf(&pdf_of_len(50_000), MIN_PDF_SIZE), Ok(()));
    }

    #[test]
    fn test_rejects_small_pdf() {
        assert_eq!(
            validate_pdf(&pdf_of_len(MIN_PDF_SIZE - 1), MIN_PDF_SIZE),
            Err(FailureReason::TooSmall)
        );
        assert_eq!(validate_pdf(b"%PDF", MIN_PDF_SIZE), Err(FailureReason::TooSmall));
    }

    #[test]
    fn test_rejects_wrong_signature() {
        let mut html = b"<html><body>Not found</body></html>".to_vec();
        html.resize(5000, b' ');
        assert_eq!(
            validate_pdf(&html, MIN_PDF_SIZE),
            Err(FailureReason::SignatureMismatch)
        );
        assert_eq!(validate_pdf(b"", MIN_PDF_SIZE), Err(FailureReason::SignatureMismatch));
        assert_eq!(validate_pdf(b"%pdf-1.4", 0), Err(FailureReason::SignatureMismatch));
    }

    #[test]
    fn test_every_non_magic_prefix_rejected() {
        for first in 0u8..=255 {
            if first == b'%' {
                continue;
            }
            let mut body = vec![first];
            body.extend_from_slice(b"PDF");
            body.resize(2000, 0);
            assert_eq!(
                validate_pdf(&body, MIN_PDF_SIZE),
                Err(FailureReason::SignatureMismatch)
            );
        }
    }
}
