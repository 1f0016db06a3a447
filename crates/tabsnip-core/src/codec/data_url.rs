//! PNG data URLs, the form popup surfaces render directly.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;

use crate::error::{Result, SnipError};

const PNG_PREFIX: &str = "data:image/png;base64,";

/// Wraps PNG bytes in a `data:image/png;base64,` URL.
pub fn encode_png(png: &[u8]) -> String {
    format!("{PNG_PREFIX}{}", BASE64_STANDARD.encode(png))
}

/// Extracts the PNG bytes from a data URL produced by [`encode_png`].
///
/// # Errors
///
/// Returns [`SnipError::Decode`] when the prefix is missing or the payload
/// is not valid base64.
pub fn decode_png(url: &str) -> Result<Vec<u8>> {
    let payload = url
        .strip_prefix(PNG_PREFIX)
        .ok_or_else(|| SnipError::decode("not a PNG data URL"))?;
    BASE64_STANDARD
        .decode(payload)
        .map_err(|e| SnipError::decode(format!("invalid base64 payload: {e}")))
}
