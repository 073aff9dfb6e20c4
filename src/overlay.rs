//! Overlay layers as they travel between editor and server.
//!
//! On the wire an overlay is a data URL (`data:image/png;base64,...`). A bare
//! base64 payload without the `data:` header is accepted as well.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum OverlayError {
    #[error("overlay is empty")]
    Empty,
    #[error("overlay is not valid base64: {0}")]
    Base64(String),
}

/// A decoded overlay: encoded image bytes plus the MIME type the header named.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Overlay {
    pub mime: Option<String>,
    pub bytes: Vec<u8>,
}

impl Overlay {
    /// Decode a `data:image/<fmt>;base64,` URL or a bare base64 string.
    pub fn from_data_url(input: &str) -> Result<Self, OverlayError> {
        let input = input.trim();
        let (mime, payload) = match split_image_header(input) {
            Some((mime, payload)) => (Some(mime.to_string()), payload),
            None => (None, input),
        };

        let compact: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
        if compact.is_empty() {
            return Err(OverlayError::Empty);
        }
        let bytes = STANDARD
            .decode(compact)
            .map_err(|e| OverlayError::Base64(e.to_string()))?;

        Ok(Self { mime, bytes })
    }
}

/// Encode image bytes as a data URL.
pub fn to_data_url(mime: &str, bytes: &[u8]) -> String {
    format!("data:{mime};base64,{}", STANDARD.encode(bytes))
}

/// Match `data:image/<word>;base64,` and return (`image/<word>`, rest).
fn split_image_header(input: &str) -> Option<(&str, &str)> {
    let rest = input.strip_prefix("data:")?;
    let (mime, payload) = rest.split_once(";base64,")?;
    let subtype = mime.strip_prefix("image/")?;
    let is_word = !subtype.is_empty()
        && subtype
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    is_word.then_some((mime, payload))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_png_data_url() {
        let overlay = Overlay::from_data_url("data:image/png;base64,AQID").unwrap();
        assert_eq!(overlay.mime.as_deref(), Some("image/png"));
        assert_eq!(overlay.bytes, vec![1, 2, 3]);
    }

    #[test]
    fn decodes_bare_base64() {
        let overlay = Overlay::from_data_url("AQID").unwrap();
        assert_eq!(overlay.mime, None);
        assert_eq!(overlay.bytes, vec![1, 2, 3]);
    }

    #[test]
    fn tolerates_line_breaks() {
        let overlay = Overlay::from_data_url("data:image/webp;base64,AQ\nID").unwrap();
        assert_eq!(overlay.bytes, vec![1, 2, 3]);
    }

    #[test]
    fn non_image_header_is_not_stripped() {
        // Treated as raw base64, which then fails on ':' and ';'.
        assert!(matches!(
            Overlay::from_data_url("data:text/plain;base64,AQID"),
            Err(OverlayError::Base64(_))
        ));
    }

    #[test]
    fn empty_payload_rejected() {
        assert_eq!(
            Overlay::from_data_url("data:image/png;base64,"),
            Err(OverlayError::Empty)
        );
        assert_eq!(Overlay::from_data_url("   "), Err(OverlayError::Empty));
    }

    #[test]
    fn data_url_roundtrip() {
        let url = to_data_url("image/png", &[9, 8, 7]);
        assert_eq!(url, "data:image/png;base64,CQgH");
        assert_eq!(Overlay::from_data_url(&url).unwrap().bytes, vec![9, 8, 7]);
    }
}
