//! Inline image data. Uploaded images are stored in the record itself as
//! `data:<mime>;base64,<payload>` strings; the store treats them as opaque.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// Encode raw image bytes as a data URL.
pub fn data_url(mime: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime, STANDARD.encode(bytes))
}

/// Decode a base64 data URL into its mime type and bytes.
///
/// Returns None for plain paths/URLs and for malformed payloads.
pub fn decode_data_url(image: &str) -> Option<(String, Vec<u8>)> {
    let rest = image.strip_prefix("data:")?;
    let (mime, payload) = rest.split_once(";base64,")?;
    let bytes = STANDARD.decode(payload).ok()?;
    Some((mime.to_string(), bytes))
}

/// Whether the image is stored inline rather than referenced by path.
pub fn is_inline(image: &str) -> bool {
    image.starts_with("data:")
}
