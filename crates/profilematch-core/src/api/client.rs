//! API client for the profile matcher REST service.
//!
//! Every operation attaches bearer headers (explicit token or the stored
//! one), makes a single request, and maps failures to `ApiError`.

use std::time::Duration;

use anyhow::{Context, Result};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::{header, Client, Method, Url};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use super::response::normalize_profile_list;
use super::ApiError;
use crate::auth::{build_headers, StoredToken, TokenStore, DEFAULT_EXPIRES_IN_SECS};
use crate::models::{
    CreateProfileRequest, HealthStatus, MutationResponse, Profile, UpdateProfileRequest,
};

// ============================================================================
// Constants
// ============================================================================

/// HTTP request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Characters escaped in a query value. Matches JavaScript's
/// `encodeURIComponent`, so a space is sent as `%20` rather than `+`.
const QUERY_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

#[derive(Debug, Serialize)]
struct AuthRequest<'a> {
    username: &'a str,
    password: &'a str,
}

/// Token issuers disagree on the field name, so all three are accepted.
#[derive(Debug, Default, Deserialize)]
struct AuthResponse {
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    id_token: Option<String>,
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    expires_in: Option<u64>,
}

impl AuthResponse {
    fn into_token(self) -> Option<(String, u64)> {
        let expires_in = self
            .expires_in
            .filter(|secs| *secs > 0)
            .unwrap_or(DEFAULT_EXPIRES_IN_SECS);
        [self.token, self.id_token, self.access_token]
            .into_iter()
            .flatten()
            .find(|t| !t.is_empty())
            .map(|t| (t, expires_in))
    }
}

/// API client for the profile matcher service.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
    auth_url: Option<Url>,
    tokens: TokenStore,
    token: Option<String>,
}

impl ApiClient {
    /// Create a new API client for the service at `base_url`
    pub fn new(base_url: &str, tokens: TokenStore) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        let base_url = Url::parse(base_url)
            .with_context(|| format!("Invalid API base URL: {}", base_url))?;
        if base_url.cannot_be_a_base() {
            anyhow::bail!("API base URL cannot have paths appended: {}", base_url);
        }

        Ok(Self {
            client,
            base_url,
            auth_url: None,
            tokens,
            token: None,
        })
    }

    /// Set the endpoint used by `authenticate`
    pub fn with_auth_url(mut self, auth_url: &str) -> Result<Self> {
        let url = Url::parse(auth_url)
            .with_context(|| format!("Invalid authentication URL: {}", auth_url))?;
        self.auth_url = Some(url);
        Ok(self)
    }

    /// Create a client that sends `token` instead of reading the token store,
    /// sharing the connection pool.
    pub fn with_token(&self, token: String) -> Self {
        Self {
            token: Some(token),
            ..self.clone()
        }
    }

    pub fn token_store(&self) -> &TokenStore {
        &self.tokens
    }

    /// Exchange credentials for a token and persist it.
    ///
    /// The token is stored before returning, so callers can move the
    /// session to authenticated right away.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<StoredToken> {
        let url = self
            .auth_url
            .clone()
            .ok_or_else(|| anyhow::anyhow!("No authentication endpoint configured"))?;

        let response = self
            .client
            .post(url.clone())
            .header(header::CONTENT_TYPE, "application/json")
            .json(&AuthRequest { username, password })
            .send()
            .await
            .map_err(ApiError::from)
            .with_context(|| format!("Failed to send authentication request to {}", url))?;

        let auth: AuthResponse = Self::read_json("Authentication failed", response).await?;
        let (token, expires_in) = auth.into_token().ok_or_else(|| {
            ApiError::InvalidResponse("authentication response did not include a token".to_string())
        })?;

        let expires_at = self
            .tokens
            .store(&token, expires_in)
            .await
            .map_err(ApiError::from)?;

        info!(username, expires_in, "Authenticated");
        Ok(StoredToken {
            value: token,
            expires_at,
        })
    }

    /// Build a URL from the base URL plus percent-encoded path segments.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("API base URL cannot have paths appended"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Check if response is successful, returning an error built from the
    /// body if not.
    async fn check_response(operation: &str, response: reqwest::Response) -> Result<reqwest::Response> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        warn!(
            operation,
            status = status.as_u16(),
            body = %ApiError::truncate_body(&body),
            "Request failed"
        );
        Err(ApiError::from_status(operation, status, &body).into())
    }

    async fn read_json<T: DeserializeOwned>(operation: &str, response: reqwest::Response) -> Result<T> {
        let response = Self::check_response(operation, response).await?;
        let url = response.url().clone();
        let text = response.text().await.map_err(ApiError::from)?;
        let parsed = serde_json::from_str(&text).map_err(|e| {
            ApiError::InvalidResponse(format!("Failed to parse JSON response from {}: {}", url, e))
        })?;
        Ok(parsed)
    }

    async fn request<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        operation: &str,
        method: Method,
        url: Url,
        body: Option<&B>,
    ) -> Result<T> {
        let headers = build_headers(self.token.as_deref(), &self.tokens).await?;

        debug!(method = %method, url = %url, "Sending request");
        let mut builder = self.client.request(method.clone(), url.clone()).headers(headers);
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(ApiError::from)
            .with_context(|| format!("Failed to send {} request to {}", method, url))?;

        Self::read_json(operation, response).await
    }

    async fn get<T: DeserializeOwned>(&self, operation: &str, url: Url) -> Result<T> {
        self.request::<T, ()>(operation, Method::GET, url, None).await
    }

    // ===== Health =====

    pub async fn check_health(&self) -> Result<HealthStatus> {
        let url = self.endpoint(&["health"])?;
        self.get("Health check failed", url).await
    }

    // ===== Profiles =====

    pub async fn list_profiles(&self) -> Result<Vec<Profile>> {
        let url = self.endpoint(&["profiles"])?;
        let body: Value = self.get("Failed to fetch profiles", url).await?;
        let profiles = normalize_profile_list(body)?;
        debug!(count = profiles.len(), "Fetched profiles");
        Ok(profiles)
    }

    pub async fn get_profile(&self, user_id: &str) -> Result<Profile> {
        let url = self.endpoint(&["profiles", user_id])?;
        self.get("Failed to fetch profile", url).await
    }

    pub async fn create_profile(&self, profile: &CreateProfileRequest) -> Result<MutationResponse> {
        let url = self.endpoint(&["profiles"])?;
        self.request("Failed to create profile", Method::POST, url, Some(profile))
            .await
    }

    pub async fn update_profile(
        &self,
        user_id: &str,
        update: &UpdateProfileRequest,
    ) -> Result<MutationResponse> {
        let url = self.endpoint(&["profiles", user_id])?;
        self.request("Failed to update profile", Method::PUT, url, Some(update))
            .await
    }

    pub async fn delete_profile(&self, user_id: &str) -> Result<MutationResponse> {
        let url = self.endpoint(&["profiles", user_id])?;
        self.request::<_, ()>("Failed to delete profile", Method::DELETE, url, None)
            .await
    }

    pub async fn search_profiles(&self, query: &str) -> Result<Vec<Profile>> {
        let mut url = self.endpoint(&["profiles", "search"])?;
        url.set_query(Some(&format!("q={}", utf8_percent_encode(query, QUERY_COMPONENT))));
        let body: Value = self.get("Failed to search profiles", url).await?;
        let profiles = normalize_profile_list(body)?;
        debug!(count = profiles.len(), "Search returned profiles");
        Ok(profiles)
    }
}
