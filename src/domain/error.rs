use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Core domain errors
///
/// These describe infrastructure problems the caller cannot resolve.
/// Authorization outcomes (key not found, rate limited, ...) are never
/// errors; they travel inside `VerifyKeyResponse` as an [`ErrorCode`].
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Bad request: {message}")]
    BadRequest { message: String },

    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("Conflict: {message}")]
    Conflict { message: String },

    #[error("Storage error: {message}")]
    Storage { message: String },

    #[error("Cache error: {message}")]
    Cache { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl DomainError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    pub fn cache(message: impl Into<String>) -> Self {
        Self::Cache {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

/// Machine-readable outcome codes carried inside `valid = false` responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    NotFound,
    Forbidden,
    Ratelimited,
    UsageExceeded,
    BadRequest,
    Internal,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bad_request_error() {
        let error = DomainError::bad_request("key must not be empty");
        assert_eq!(error.to_string(), "Bad request: key must not be empty");
    }

    #[test]
    fn test_not_found_error() {
        let error = DomainError::not_found("key 'key_123' not found");
        assert_eq!(error.to_string(), "Not found: key 'key_123' not found");
    }

    #[test]
    fn test_error_code_wire_format() {
        let json = serde_json::to_string(&ErrorCode::UsageExceeded).unwrap();
        assert_eq!(json, "\"USAGE_EXCEEDED\"");

        let json = serde_json::to_string(&ErrorCode::Ratelimited).unwrap();
        assert_eq!(json, "\"RATELIMITED\"");
    }
}
