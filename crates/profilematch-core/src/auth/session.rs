use tracing::{debug, info, warn};

use super::TokenStore;
use crate::storage::StorageError;

/// Authentication state of the running client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Loading,
    Authenticated { token: String },
    Unauthenticated,
}

/// Process-wide authentication state.
///
/// Owned by the composition root and handed to callers by reference; every
/// transition takes `&mut self`, so there is a single writer.
pub struct SessionContext {
    tokens: TokenStore,
    state: SessionState,
}

impl SessionContext {
    pub fn new(tokens: TokenStore) -> Self {
        Self {
            tokens,
            state: SessionState::Uninitialized,
        }
    }

    /// Create a context and immediately restore it from storage.
    pub async fn restored(tokens: TokenStore) -> Self {
        let mut session = Self::new(tokens);
        session.restore().await;
        session
    }

    /// Restore the session from the token store.
    ///
    /// Storage faults are logged and leave the session logged out.
    pub async fn restore(&mut self) {
        self.state = SessionState::Loading;

        self.state = match self.tokens.retrieve().await {
            Ok(Some(token)) => {
                debug!("Restored session from stored token");
                SessionState::Authenticated { token }
            }
            Ok(None) => SessionState::Unauthenticated,
            Err(e) => {
                warn!(error = %e, "Failed to restore session, continuing logged out");
                SessionState::Unauthenticated
            }
        };
    }

    /// Mark the session as authenticated with `token`.
    ///
    /// This only updates in-memory state; persist the token first
    /// (`ApiClient::authenticate` or `TokenStore::store`).
    pub fn login(&mut self, token: String) {
        info!("Session authenticated");
        self.state = SessionState::Authenticated { token };
    }

    /// Clear the stored token and log out.
    ///
    /// If clearing storage fails the session stays as it was.
    pub async fn logout(&mut self) -> Result<(), StorageError> {
        self.tokens.clear().await?;
        self.state = SessionState::Unauthenticated;
        info!("Session logged out");
        Ok(())
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self.state, SessionState::Authenticated { .. })
    }

    /// True only while the initial restore is running.
    pub fn is_loading(&self) -> bool {
        matches!(self.state, SessionState::Loading)
    }

    pub fn token(&self) -> Option<&str> {
        match &self.state {
            SessionState::Authenticated { token } => Some(token.as_str()),
            _ => None,
        }
    }

    pub fn token_store(&self) -> &TokenStore {
        &self.tokens
    }
}
