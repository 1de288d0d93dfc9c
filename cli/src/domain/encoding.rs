//! Encoding helpers for URLs passed on the command line and for digests.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

use crate::domain::error::HostError;

/// Decode a base64-encoded `http(s)` URL.
///
/// Run-command parameters carry SAS URLs base64-encoded so that `&` and `?`
/// survive shell quoting. Surrounding whitespace and line breaks are ignored.
///
/// # Errors
///
/// Returns `HostError::InvalidPackageUrl` if the input is not base64, not
/// UTF-8, or not an `http`/`https` URL.
pub fn decode_base64_url(encoded: &str) -> Result<String, HostError> {
    let compact: String = encoded.split_whitespace().collect();
    if compact.is_empty() {
        return Err(HostError::InvalidPackageUrl("empty value".to_string()));
    }
    let bytes = STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| HostError::InvalidPackageUrl(format!("not base64: {e}")))?;
    let url = String::from_utf8(bytes)
        .map_err(|_| HostError::InvalidPackageUrl("not UTF-8".to_string()))?;
    let url = url.trim().to_string();
    if !(url.starts_with("https://") || url.starts_with("http://")) {
        return Err(HostError::InvalidPackageUrl(
            "decoded value is not an http(s) URL".to_string(),
        ));
    }
    Ok(url)
}

/// Strip the query string so SAS tokens never reach logs or reports.
#[must_use]
pub fn redact_url(url: &str) -> &str {
    url.split_once('?').map_or(url, |(base, _)| base)
}

/// Lowercase hex encoding.
#[must_use]
pub fn hex_encode(bytes: &[u8]) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(bytes.len() * 2);
    for &b in bytes {
        out.push(char::from(HEX[(b >> 4) as usize]));
        out.push(char::from(HEX[(b & 0xf) as usize]));
    }
    out
}
