use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use super::clock::{Clock, SystemClock};
use crate::storage::{KeyValueStore, StorageError};

/// Storage key for the bearer token
pub const TOKEN_KEY: &str = "auth_token";

/// Storage key for the absolute expiry, in ms since epoch, as a decimal string
pub const TOKEN_EXPIRY_KEY: &str = "auth_token_expiry";

/// Token lifetime used when the issuer does not say otherwise.
pub const DEFAULT_EXPIRES_IN_SECS: u64 = 3600;

/// Treat a token as unusable this long before it actually expires (5 minutes)
const EXPIRY_BUFFER_MS: i64 = 5 * 60 * 1000;

/// A bearer token together with its absolute expiry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredToken {
    pub value: String,
    pub expires_at: i64,
}

impl StoredToken {
    /// A token is usable strictly before `expires_at - 5 min`.
    pub fn is_usable_at(&self, now_millis: i64) -> bool {
        now_millis < self.expires_at.saturating_sub(EXPIRY_BUFFER_MS)
    }

    pub fn expires_at_utc(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.expires_at)
    }

    /// Get minutes remaining until the server-side expiry (for display)
    pub fn minutes_until_expiry(&self, now_millis: i64) -> i64 {
        (self.expires_at.saturating_sub(now_millis) / 60_000).max(0)
    }
}

/// Persists the session token and its expiry in a `KeyValueStore`.
///
/// Clone is cheap; clones share the underlying store.
#[derive(Clone)]
pub struct TokenStore {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
}

impl TokenStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_clock(store, Arc::new(SystemClock))
    }

    pub fn with_clock(store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Persist `token` so that it expires `expires_in_secs` from now.
    /// Token and expiry are written as one batch. Returns the absolute expiry.
    pub async fn store(&self, token: &str, expires_in_secs: u64) -> Result<i64, StorageError> {
        let lifetime_ms = i64::try_from(expires_in_secs)
            .unwrap_or(i64::MAX)
            .saturating_mul(1000);
        let expires_at = self.clock.now_millis().saturating_add(lifetime_ms);
        let expiry = expires_at.to_string();

        self.store
            .set_many(&[(TOKEN_KEY, token), (TOKEN_EXPIRY_KEY, expiry.as_str())])
            .await?;

        debug!(expires_at, "Stored auth token");
        Ok(expires_at)
    }

    /// Persist `token` with the default one-hour lifetime.
    pub async fn store_default(&self, token: &str) -> Result<i64, StorageError> {
        self.store(token, DEFAULT_EXPIRES_IN_SECS).await
    }

    /// Read the stored token and expiry without checking expiry.
    ///
    /// An expiry that is not a number is reported as `i64::MIN`, which no
    /// clock reading will accept.
    pub async fn load(&self) -> Result<Option<StoredToken>, StorageError> {
        let values = self.store.get_many(&[TOKEN_KEY, TOKEN_EXPIRY_KEY]).await?;
        let mut values = values.into_iter();
        let token = values.next().flatten();
        let expiry = values.next().flatten();

        let (Some(value), Some(expiry)) = (token, expiry) else {
            return Ok(None);
        };
        if value.is_empty() || expiry.is_empty() {
            return Ok(None);
        }

        let expires_at = match expiry.trim().parse::<i64>() {
            Ok(ts) => ts,
            Err(_) => {
                warn!(expiry = %expiry, "Stored token expiry is not a timestamp");
                i64::MIN
            }
        };
        Ok(Some(StoredToken { value, expires_at }))
    }

    /// Return the stored token if it is still usable.
    ///
    /// A token inside the expiry buffer is cleared from storage and reported
    /// as absent, even if clearing it fails.
    pub async fn retrieve(&self) -> Result<Option<String>, StorageError> {
        let Some(token) = self.load().await? else {
            return Ok(None);
        };

        if !token.is_usable_at(self.clock.now_millis()) {
            debug!(expires_at = token.expires_at, "Stored auth token expired, clearing");
            // The token is unusable whether or not the clear lands
            if let Err(e) = self.clear().await {
                warn!(error = %e, "Failed to clear expired auth token");
            }
            return Ok(None);
        }

        Ok(Some(token.value))
    }

    /// Remove token and expiry. Clearing an empty store succeeds.
    pub async fn clear(&self) -> Result<(), StorageError> {
        self.store.remove_many(&[TOKEN_KEY, TOKEN_EXPIRY_KEY]).await
    }

    /// Check whether a usable token is stored. Storage faults count as "no".
    pub async fn is_authenticated(&self) -> bool {
        match self.retrieve().await {
            Ok(token) => token.is_some(),
            Err(e) => {
                warn!(error = %e, "Failed to check stored auth token");
                false
            }
        }
    }

    pub fn now_millis(&self) -> i64 {
        self.clock.now_millis()
    }
}
