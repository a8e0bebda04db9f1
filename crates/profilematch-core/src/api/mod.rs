//! REST API client module for the profile matcher service.
//!
//! This module provides the `ApiClient` for health checks and profile
//! CRUD/search, the `ApiError` taxonomy, and normalization of the list
//! responses, which the service wraps inconsistently.
//!
//! Requests authenticate with a bearer token taken from the `TokenStore`
//! unless the client was given one explicitly.

pub mod client;
pub mod error;
pub mod response;

pub use client::ApiClient;
pub use error::ApiError;
pub use response::{normalize_profile_list, ProfileList};
