//! Header-based service auth. Both `X-API-Key` (chat backend channels,
//! ingestion, admin context) and `X-Internal-Key` (CORS management) are
//! checked against the same configured secret rather than two
//! independent ones.

use axum::http::HeaderMap;
use switchboard_core::secrets_match;

use crate::error::ApiError;

fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

pub fn require_api_key(headers: &HeaderMap, expected: &str) -> Result<(), ApiError> {
    match header_value(headers, "x-api-key") {
        Some(provided) if secrets_match(provided, expected) => Ok(()),
        _ => Err(ApiError::Unauthorized("invalid or missing X-API-Key")),
    }
}

pub fn require_internal_key(headers: &HeaderMap, expected: &str) -> Result<(), ApiError> {
    match header_value(headers, "x-internal-key") {
        Some(provided) if secrets_match(provided, expected) => Ok(()),
        _ => Err(ApiError::Unauthorized("invalid or missing X-Internal-Key")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn rejects_missing_header() {
        let headers = HeaderMap::new();
        assert!(require_api_key(&headers, "secret").is_err());
    }

    #[test]
    fn accepts_matching_header() {
        let mut headers = HeaderMap::new();
        headers.insert("x-api-key", HeaderValue::from_static("secret"));
        assert!(require_api_key(&headers, "secret").is_ok());
    }

    #[test]
    fn rejects_mismatched_header() {
        let mut headers = HeaderMap::new();
        headers.insert("x-internal-key", HeaderValue::from_static("wrong"));
        assert!(require_internal_key(&headers, "secret").is_err());
    }
}
