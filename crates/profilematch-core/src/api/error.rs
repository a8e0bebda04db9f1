use reqwest::StatusCode;
use thiserror::Error;

use crate::storage::StorageError;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("No authentication token available - login required")]
    NoToken,

    #[error("Authentication token contains characters not allowed in a header")]
    InvalidToken,

    #[error("{operation}: {message}")]
    Request {
        operation: String,
        status: StatusCode,
        message: String,
    },

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Maximum length for error response bodies in log output
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    pub fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            return body.to_string();
        }
        let mut end = MAX_ERROR_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
    }

    /// Build a request error from a failed response.
    ///
    /// The message comes from the body's `message` field when the body is
    /// JSON and has one, otherwise from the status text. A body that is not
    /// JSON is treated as an empty object.
    pub fn from_status(operation: &str, status: StatusCode, body: &str) -> Self {
        let parsed: serde_json::Value =
            serde_json::from_str(body).unwrap_or_else(|_| serde_json::json!({}));

        let message = parsed
            .get("message")
            .and_then(|m| m.as_str())
            .filter(|m| !m.is_empty())
            .map(str::to_string)
            .or_else(|| status.canonical_reason().map(str::to_string))
            .unwrap_or_else(|| status.as_u16().to_string());

        ApiError::Request {
            operation: operation.to_string(),
            status,
            message,
        }
    }

    /// HTTP status of a failed request, if this is one.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Request { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Human-readable message of a failed request, if this is one.
    pub fn message(&self) -> Option<&str> {
        match self {
            ApiError::Request { message, .. } => Some(message.as_str()),
            _ => None,
        }
    }

    /// Whether the caller should send the user back to login.
    pub fn requires_login(&self) -> bool {
        matches!(self, ApiError::NoToken)
            || self.status() == Some(StatusCode::UNAUTHORIZED)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_from_json_body() {
        let err = ApiError::from_status(
            "Failed to fetch profiles",
            StatusCode::NOT_FOUND,
            r#"{"message":"not found"}"#,
        );
        assert_eq!(err.message(), Some("not found"));
        assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
        assert_eq!(err.to_string(), "Failed to fetch profiles: not found");
    }

    #[test]
    fn test_malformed_body_falls_back_to_status_text() {
        let err = ApiError::from_status("Failed to delete profile", StatusCode::BAD_GATEWAY, "<html>");
        assert_eq!(err.message(), Some("Bad Gateway"));
    }

    #[test]
    fn test_body_without_message_falls_back_to_status_text() {
        for body in ["", "{}", r#"{"message":""}"#, r#"{"message":12}"#, "[1,2]"] {
            let err = ApiError::from_status("Health check failed", StatusCode::SERVICE_UNAVAILABLE, body);
            assert_eq!(err.message(), Some("Service Unavailable"), "body: {body}");
        }
    }

    #[test]
    fn test_unknown_status_uses_code() {
        let status = StatusCode::from_u16(599).unwrap();
        let err = ApiError::from_status("Failed to fetch profile", status, "");
        assert_eq!(err.message(), Some("599"));
    }

    #[test]
    fn test_requires_login() {
        assert!(ApiError::NoToken.requires_login());
        assert!(ApiError::from_status("x", StatusCode::UNAUTHORIZED, "").requires_login());
        assert!(!ApiError::from_status("x", StatusCode::NOT_FOUND, "").requires_login());
    }

    #[test]
    fn test_truncate_body() {
        let short = "short body";
        assert_eq!(ApiError::truncate_body(short), short);

        let long = "é".repeat(400);
        let truncated = ApiError::truncate_body(&long);
        assert!(truncated.contains("(truncated, 800 total bytes)"));
    }
}
