//! Error types for homesense
//!
//! One enum for every failure a route can surface. Each variant maps to a
//! status code and a stable machine-readable code for the JSON error body.

use hyper::StatusCode;

/// Main error type for homesense operations
#[derive(Debug, thiserror::Error)]
pub enum HubError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Duplicate key: {0}")]
    DuplicateKey(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl HubError {
    /// Convert error to HTTP status code
    ///
    /// Anything that is not the caller's fault is a 500, including a
    /// duplicate registration.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Upstream(_)
            | Self::Database(_)
            | Self::DuplicateKey(_)
            | Self::Internal(_)
            | Self::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable error code for the response body
    pub fn code(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::Unauthorized(_) => "INVALID_CREDENTIALS",
            Self::NotFound(_) => "USER_NOT_FOUND",
            Self::Upstream(_) => "UPSTREAM_ERROR",
            Self::Database(_) => "DB_ERROR",
            Self::DuplicateKey(_) => "DUPLICATE_EMAIL",
            Self::Internal(_) => "INTERNAL_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
        }
    }

    /// Message safe to show to a client
    ///
    /// Store and network details stay in the logs.
    pub fn public_message(&self) -> String {
        match self {
            Self::BadRequest(msg) => msg.clone(),
            Self::Unauthorized(_) => "Incorrect password".to_string(),
            Self::NotFound(_) => "User not found".to_string(),
            Self::Upstream(_) => "IoT cloud request failed".to_string(),
            Self::DuplicateKey(_) => "Email already registered".to_string(),
            Self::Database(_) | Self::Internal(_) | Self::Config(_) => {
                "Internal server error".to_string()
            }
        }
    }
}

impl From<std::io::Error> for HubError {
    fn from(err: std::io::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Result type alias for homesense operations
pub type Result<T> = std::result::Result<T, HubError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(HubError::BadRequest("x".into()).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(HubError::Unauthorized("x".into()).status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(HubError::NotFound("x".into()).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            HubError::Upstream("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            HubError::DuplicateKey("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_public_message_hides_details() {
        let err = HubError::Database("connection refused at 10.0.0.3:27017".into());
        assert_eq!(err.public_message(), "Internal server error");
        assert_eq!(err.code(), "DB_ERROR");
    }
}
