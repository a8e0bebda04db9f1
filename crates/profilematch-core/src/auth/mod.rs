//! Authentication module for managing the session token.
//!
//! This module provides:
//! - `TokenStore`: persisted bearer token with expiry-aware reads
//! - `build_headers`: request headers from an explicit or stored token
//! - `SessionContext`: in-memory login state restored from the token store
//!
//! Stored tokens are treated as expired 5 minutes before their real expiry.

pub mod clock;
pub mod headers;
pub mod session;
pub mod token_store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use headers::build_headers;
pub use session::{SessionContext, SessionState};
pub use token_store::{StoredToken, TokenStore, DEFAULT_EXPIRES_IN_SECS};
