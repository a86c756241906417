//! Page-token utilities for keyset pagination.
//!
//! A page token identifies the first entity of the next page. Tokens are
//! opaque to clients; an empty token is treated the same as no token.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use thiserror::Error;
use uuid::Uuid;

/// Error type for page token operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PageTokenError {
    #[error("Invalid page token encoding")]
    InvalidEncoding,
    #[error("Invalid page token format")]
    InvalidFormat,
    #[error("Invalid ID in page token")]
    InvalidId,
}

/// Encodes the ID of the first entity of the next page.
///
/// The token format is: base64(`page:` + hyphenated UUID)
pub fn encode_page_id(first_id: Uuid) -> String {
    let raw = format!("page:{}", first_id.hyphenated());
    URL_SAFE_NO_PAD.encode(raw.as_bytes())
}

/// Decodes a page token back into the entity ID it points at.
///
/// Returns `Ok(None)` for an empty token (first page).
pub fn decode_page_id(token: &str) -> Result<Option<Uuid>, PageTokenError> {
    if token.is_empty() {
        return Ok(None);
    }

    let decoded = URL_SAFE_NO_PAD
        .decode(token)
        .map_err(|_| PageTokenError::InvalidEncoding)?;
    let s = String::from_utf8(decoded).map_err(|_| PageTokenError::InvalidFormat)?;

    let id = s
        .strip_prefix("page:")
        .ok_or(PageTokenError::InvalidFormat)?;

    Uuid::parse_str(id)
        .map(Some)
        .map_err(|_| PageTokenError::InvalidId)
}
