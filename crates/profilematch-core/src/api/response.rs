//! Normalization of the list-shaped responses from the profiles API.
//!
//! List and search endpoints do not wrap their results consistently. A body
//! may look like any of:
//!
//! ```json
//! {"body": {"profiles": [...]}}
//! {"profiles": [...]}
//! [...]
//! ```
//!
//! The shapes are checked in that order on every response.

use serde_json::Value;
use tracing::debug;

use super::ApiError;
use crate::models::Profile;

/// A profile list response, classified by shape.
#[derive(Debug, Clone, PartialEq)]
pub enum ProfileList {
    /// `{"body": {"profiles": [...]}}`
    Wrapped(Value),
    /// `{"profiles": [...]}`
    Direct(Value),
    /// Anything else, taken as the list itself
    Raw(Value),
}

impl ProfileList {
    /// Classify a parsed body. A null `profiles` field counts as absent.
    pub fn classify(mut body: Value) -> Self {
        if let Some(profiles) = body.pointer_mut("/body/profiles").filter(|v| !v.is_null()) {
            return ProfileList::Wrapped(profiles.take());
        }
        if let Some(profiles) = body.get_mut("profiles").filter(|v| !v.is_null()) {
            return ProfileList::Direct(profiles.take());
        }
        ProfileList::Raw(body)
    }

    pub fn shape(&self) -> &'static str {
        match self {
            ProfileList::Wrapped(_) => "wrapped",
            ProfileList::Direct(_) => "direct",
            ProfileList::Raw(_) => "raw",
        }
    }

    pub fn into_profiles(self) -> Result<Vec<Profile>, ApiError> {
        let shape = self.shape();
        let list = match self {
            ProfileList::Wrapped(v) | ProfileList::Direct(v) | ProfileList::Raw(v) => v,
        };
        serde_json::from_value(list).map_err(|e| {
            ApiError::InvalidResponse(format!("expected a list of profiles ({} shape): {}", shape, e))
        })
    }
}

/// Turn a list or search response body into profiles.
pub fn normalize_profile_list(body: Value) -> Result<Vec<Profile>, ApiError> {
    let list = ProfileList::classify(body);
    debug!(shape = list.shape(), "Normalizing profile list response");
    list.into_profiles()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn profiles_json() -> Value {
        json!([
            {"user_id": "u1", "name": "A", "email": "a@x.com", "skills": []},
            {"user_id": "u2", "name": "B", "email": "b@x.com", "bio": "hi",
             "skills": [{"name": "Rust", "level": 7}]}
        ])
    }

    #[test]
    fn test_all_shapes_normalize_to_same_list() {
        let wrapped = json!({"statusCode": 200, "body": {"profiles": profiles_json()}});
        let direct = json!({"profiles": profiles_json(), "count": 2});
        let raw = profiles_json();

        let expected = normalize_profile_list(raw.clone()).unwrap();
        assert_eq!(expected.len(), 2);
        assert_eq!(expected[0].user_id, "u1");
        assert_eq!(expected[1].skills[0].level, 7);

        assert_eq!(normalize_profile_list(wrapped).unwrap(), expected);
        assert_eq!(normalize_profile_list(direct).unwrap(), expected);
    }

    #[test]
    fn test_classify_precedence() {
        // Both present: the wrapped form wins
        let both = json!({"body": {"profiles": []}, "profiles": [{"bogus": true}]});
        assert!(matches!(ProfileList::classify(both), ProfileList::Wrapped(_)));

        // `body` without `profiles` falls through to the direct form
        let body_only = json!({"body": {"message": "ok"}, "profiles": []});
        assert!(matches!(ProfileList::classify(body_only), ProfileList::Direct(_)));

        let null_profiles = json!({"profiles": null});
        assert!(matches!(ProfileList::classify(null_profiles), ProfileList::Raw(_)));

        assert!(matches!(ProfileList::classify(json!([])), ProfileList::Raw(_)));
    }

    #[test]
    fn test_empty_wrapped_list() {
        let body = json!({"body": {"profiles": []}});
        assert!(normalize_profile_list(body).unwrap().is_empty());
    }

    #[test]
    fn test_unrecognized_object_is_invalid_response() {
        let err = normalize_profile_list(json!({"message": "ok"})).unwrap_err();
        assert!(matches!(err, ApiError::InvalidResponse(_)));
    }
}
