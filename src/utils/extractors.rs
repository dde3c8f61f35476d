use axum::extract::{FromRequest, FromRequestParts};
use http::HeaderMap;

use crate::error::{AppError, Result};

/// `axum::Json` whose rejection is reported as an `AppError`.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

/// `axum::extract::Query` whose rejection is reported as an `AppError`.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct AppQuery<T>(pub T);

#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct AppPath<T>(pub T);

/// Legacy header sent by the storefront client.
pub const LEGACY_TOKEN_HEADER: &str = "x-auth-token";

/// Pulls the admin token from `Authorization: Bearer` or `x-auth-token`.
pub fn extract_token(headers: &HeaderMap) -> Result<&str> {
    if let Some(auth_header) = headers
        .get(http::header::AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
    {
        return auth_header
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| AppError::Unauthorized("Invalid token format".to_string()));
    }

    headers
        .get(LEGACY_TOKEN_HEADER)
        .and_then(|header| header.to_str().ok())
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AppError::Unauthorized("No token, authorization denied".to_string()))
}

#[cfg(test)]
mod tests {
    use http::HeaderValue;

    use super::*;

    #[test]
    fn reads_bearer_header() {
        let mut headers = HeaderMap::new();
        headers.insert(
            http::header::AUTHORIZATION,
            HeaderValue::from_static("Bearer abc.def"),
        );

        assert_eq!(extract_token(&headers).unwrap(), "abc.def");
    }

    #[test]
    fn falls_back_to_legacy_header() {
        let mut headers = HeaderMap::new();
        headers.insert(LEGACY_TOKEN_HEADER, HeaderValue::from_static("abc.def"));

        assert_eq!(extract_token(&headers).unwrap(), "abc.def");
    }

    #[test]
    fn rejects_missing_or_malformed() {
        assert!(extract_token(&HeaderMap::new()).is_err());

        let mut headers = HeaderMap::new();
        headers.insert(
            http::header::AUTHORIZATION,
            HeaderValue::from_static("Basic abc"),
        );
        assert!(extract_token(&headers).is_err());
    }
}
