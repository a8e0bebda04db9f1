//! Core library for the profile matcher client.
//!
//! - `storage`: durable key-value backends (file, keychain, memory)
//! - `auth`: token store, auth headers, and the session context
//! - `api`: REST client for the profile matcher service
//! - `models`: profile and payload types
//! - `config`: application configuration

pub mod api;
pub mod auth;
pub mod config;
pub mod models;
pub mod storage;

pub use api::{ApiClient, ApiError};
pub use auth::{SessionContext, SessionState, TokenStore};
pub use config::Config;
pub use storage::{KeyValueStore, StorageError};
