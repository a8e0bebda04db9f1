use reqwest::header::{self, HeaderMap, HeaderValue};

use super::TokenStore;
use crate::api::ApiError;

/// Build the headers for an authenticated request.
///
/// An explicit token is used as-is and the store is never consulted.
/// Otherwise the stored token is used, and a missing or expired one fails
/// with `ApiError::NoToken`.
pub async fn build_headers(
    explicit_token: Option<&str>,
    tokens: &TokenStore,
) -> Result<HeaderMap, ApiError> {
    let token = match explicit_token {
        Some(token) => token.to_string(),
        None => tokens.retrieve().await?.ok_or(ApiError::NoToken)?,
    };
    bearer_headers(&token)
}

/// `Authorization: Bearer <token>` plus the JSON content type.
pub fn bearer_headers(token: &str) -> Result<HeaderMap, ApiError> {
    let mut headers = HeaderMap::new();
    let mut auth = HeaderValue::from_str(&format!("Bearer {}", token))
        .map_err(|_| ApiError::InvalidToken)?;
    auth.set_sensitive(true);
    headers.insert(header::AUTHORIZATION, auth);
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
    Ok(headers)
}
