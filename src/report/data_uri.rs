//! Image data URI parsing
//!
//! Reports accept the image back from the client as
//! `data:image/<subtype>;base64,<payload>`. Parsing yields the decoded bytes
//! and media type, or a [`DataUriError`] describing what was wrong.

use base64::Engine;

/// Decoded image data URI
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUri {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DataUriError {
    #[error("Missing data: scheme")]
    MissingScheme,

    #[error("Only base64 data URIs are supported")]
    NotBase64,

    #[error("Not an image media type: {0}")]
    NotAnImage(String),

    #[error("Invalid base64 payload: {0}")]
    InvalidBase64(String),

    #[error("Empty payload")]
    Empty,
}

impl DataUri {
    pub fn parse(input: &str) -> Result<Self, DataUriError> {
        let rest = input
            .trim()
            .strip_prefix("data:")
            .ok_or(DataUriError::MissingScheme)?;

        let (header, payload) = rest.split_once(',').ok_or(DataUriError::NotBase64)?;
        let mut params = header.split(';');
        let mime_type = params
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        if !params.any(|p| p.trim().eq_ignore_ascii_case("base64")) {
            return Err(DataUriError::NotBase64);
        }

        if !is_image_mime(&mime_type) {
            return Err(DataUriError::NotAnImage(mime_type));
        }

        let compact: String = payload.chars().filter(|c| !c.is_ascii_whitespace()).collect();
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(compact.as_bytes())
            .map_err(|e| DataUriError::InvalidBase64(e.to_string()))?;

        if bytes.is_empty() {
            return Err(DataUriError::Empty);
        }

        Ok(Self { mime_type, bytes })
    }
}

fn is_image_mime(mime: &str) -> bool {
    match mime.strip_prefix("image/") {
        Some(subtype) => {
            !subtype.is_empty()
                && subtype
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_png() {
        let uri = DataUri::parse("data:image/png;base64,aGVsbG8=").unwrap();
        assert_eq!(uri.mime_type, "image/png");
        assert_eq!(uri.bytes, b"hello");
    }

    #[test]
    fn test_parse_tolerates_whitespace_and_case() {
        let uri = DataUri::parse("  data:IMAGE/JPEG;BASE64,aGVs\nbG8=\n").unwrap();
        assert_eq!(uri.mime_type, "image/jpeg");
        assert_eq!(uri.bytes, b"hello");
    }

    #[test]
    fn test_parse_svg_subtype() {
        let uri = DataUri::parse("data:image/svg+xml;base64,PHN2Zy8+").unwrap();
        assert_eq!(uri.mime_type, "image/svg+xml");
    }

    #[test]
    fn test_rejects_missing_scheme() {
        assert_eq!(
            DataUri::parse("image/png;base64,aGVsbG8="),
            Err(DataUriError::MissingScheme)
        );
    }

    #[test]
    fn test_rejects_non_base64() {
        assert_eq!(
            DataUri::parse("data:image/png,hello"),
            Err(DataUriError::NotBase64)
        );
    }

    #[test]
    fn test_rejects_non_image() {
        assert_eq!(
            DataUri::parse("data:text/html;base64,PGI+"),
            Err(DataUriError::NotAnImage("text/html".to_string()))
        );
    }

    #[test]
    fn test_rejects_bad_payload() {
        assert!(matches!(
            DataUri::parse("data:image/png;base64,@@@"),
            Err(DataUriError::InvalidBase64(_))
        ));
        assert_eq!(
            DataUri::parse("data:image/png;base64,"),
            Err(DataUriError::Empty)
        );
    }
}
