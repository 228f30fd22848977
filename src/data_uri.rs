//! `data:` URI helpers for handing encoded images around as strings.

use base64::{engine::general_purpose, Engine as _};

use crate::error::ExpandError;

pub const PNG_MIME: &str = "image/png";

pub fn encode(mime_type: &str, bytes: &[u8]) -> String {
    format!(
        "data:{};base64,{}",
        mime_type,
        general_purpose::STANDARD.encode(bytes)
    )
}

/// Splits a `data:<mime>;base64,<payload>` URI into its media type and bytes.
///
/// A bare base64 string is accepted too and reported with an empty media type.
pub fn decode(uri: &str) -> Result<(String, Vec<u8>), ExpandError> {
    let uri = uri.trim();
    let (mime_type, payload) = match uri.strip_prefix("data:") {
        Some(rest) => {
            let (header, payload) = rest
                .split_once(',')
                .ok_or_else(|| ExpandError::ImageDecode("data URI has no payload".to_string()))?;
            let mime_type = header.strip_suffix(";base64").ok_or_else(|| {
                ExpandError::ImageDecode("only base64 data URIs are supported".to_string())
            })?;
            (mime_type.to_string(), payload)
        }
        None => (String::new(), uri),
    };

    let bytes = general_purpose::STANDARD
        .decode(payload)
        .map_err(|e| ExpandError::ImageDecode(format!("invalid base64 payload: {}", e)))?;

    Ok((mime_type, bytes))
}
