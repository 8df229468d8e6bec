//! `Authorization: Bearer <token>` parsing.

use http::{HeaderMap, header};

const SCHEME: &str = "Bearer";

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum BearerError {
    #[error("authorization header is missing")]
    Missing,
    #[error("authorization header is not a bearer credential")]
    Malformed,
}

/// Borrow the token from the `Authorization` header.
///
/// The scheme is matched case-insensitively. An empty token, a non-ASCII
/// header value or any other scheme is [`BearerError::Malformed`].
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, BearerError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or(BearerError::Missing)?;
    let value = value.to_str().map_err(|_| BearerError::Malformed)?;

    let (scheme, token) = value.split_once(' ').ok_or(BearerError::Malformed)?;
    if !scheme.eq_ignore_ascii_case(SCHEME) {
        return Err(BearerError::Malformed);
    }

    let token = token.trim();
    if token.is_empty() || token.contains(' ') {
        return Err(BearerError::Malformed);
    }
    Ok(token)
}

/// Build the header value a client would send.
pub fn bearer_header(token: &str) -> String {
    format!("{SCHEME} {token}")
}
