//! Data models for the profile matcher API.
//!
//! - `Profile`, `Skill`: the profile entity and its skills
//! - `CreateProfileRequest`, `UpdateProfileRequest`: mutation bodies
//! - `MutationResponse`, `HealthStatus`: response payloads

pub mod profile;

pub use profile::{
    CreateProfileRequest, HealthStatus, MutationResponse, Profile, Skill, UpdateProfileRequest,
};
