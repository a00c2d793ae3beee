//! Unified error types shared by every Strata crate.

use std::fmt::Debug;
use thiserror::Error;

/// Unified error type for Strata.
///
/// Pagination, cache, configuration and security failures all map onto this
/// enum so callers only ever match on one error type.
#[derive(Error, Debug)]
pub enum StrataError {
    // ============ Argument Errors ============
    /// Invalid argument (e.g. a zero page size or a zero TTL)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    // ============ Backend Errors ============
    /// Key-value backend unreachable or erroring
    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),

    /// Value could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Backend command exceeded its deadline
    #[error("Operation timed out: {0}")]
    Timeout(String),

    // ============ Authentication/Authorization Errors ============
    /// No valid principal in the current security context
    #[error("Authentication expired")]
    AuthenticationExpired,

    /// Principal lacks a required authority
    #[error("Forbidden: {0}")]
    Forbidden(String),

    // ============ Infrastructure Errors ============
    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    // ============ Internal Errors ============
    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// Generic error wrapper
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl StrataError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::InvalidArgument(_) => 400,
            Self::AuthenticationExpired => 401,
            Self::Forbidden(_) => 403,
            Self::BackendUnavailable(_) | Self::Timeout(_) => 503,
            Self::Serialization(_)
            | Self::Configuration(_)
            | Self::Internal(_)
            | Self::Other(_) => 500,
        }
    }

    /// Returns a machine-readable error code.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidArgument(_) => "INVALID_ARGUMENT",
            Self::BackendUnavailable(_) => "BACKEND_UNAVAILABLE",
            Self::Serialization(_) => "SERIALIZATION_ERROR",
            Self::Timeout(_) => "TIMEOUT",
            Self::AuthenticationExpired => "AUTHENTICATION_EXPIRED",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::Configuration(_) => "CONFIGURATION_ERROR",
            Self::Internal(_) | Self::Other(_) => "INTERNAL_ERROR",
        }
    }

    /// Creates an invalid argument error.
    #[must_use]
    pub fn invalid_argument<T: Into<String>>(message: T) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Creates a backend unavailable error.
    #[must_use]
    pub fn backend<T: Into<String>>(message: T) -> Self {
        Self::BackendUnavailable(message.into())
    }

    /// Creates a forbidden error.
    #[must_use]
    pub fn forbidden<T: Into<String>>(message: T) -> Self {
        Self::Forbidden(message.into())
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal<T: Into<String>>(message: T) -> Self {
        Self::Internal(message.into())
    }

    /// Checks if this error originates from the storage backend or its wire format.
    #[must_use]
    pub const fn is_backend_failure(&self) -> bool {
        matches!(
            self,
            Self::BackendUnavailable(_) | Self::Timeout(_) | Self::Serialization(_)
        )
    }

    /// Checks if this error is retriable.
    #[must_use]
    pub const fn is_retriable(&self) -> bool {
        matches!(self, Self::BackendUnavailable(_) | Self::Timeout(_))
    }
}

impl From<serde_json::Error> for StrataError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(format!("JSON serialization error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_codes() {
        assert_eq!(StrataError::invalid_argument("page size").status_code(), 400);
        assert_eq!(StrataError::AuthenticationExpired.status_code(), 401);
        assert_eq!(StrataError::forbidden("no authority").status_code(), 403);
        assert_eq!(StrataError::backend("down").status_code(), 503);
        assert_eq!(StrataError::Timeout("slow".to_string()).status_code(), 503);
        assert_eq!(StrataError::internal("oops").status_code(), 500);
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(StrataError::invalid_argument("x").error_code(), "INVALID_ARGUMENT");
        assert_eq!(StrataError::backend("x").error_code(), "BACKEND_UNAVAILABLE");
        assert_eq!(StrataError::AuthenticationExpired.error_code(), "AUTHENTICATION_EXPIRED");
        assert_eq!(StrataError::Configuration("x".to_string()).error_code(), "CONFIGURATION_ERROR");
        assert_eq!(StrataError::internal("x").error_code(), "INTERNAL_ERROR");
    }

    #[test]
    fn test_backend_failures() {
        assert!(StrataError::backend("connection refused").is_backend_failure());
        assert!(StrataError::Timeout("2s".to_string()).is_backend_failure());
        assert!(StrataError::Serialization("bad json".to_string()).is_backend_failure());
        assert!(!StrataError::invalid_argument("ttl").is_backend_failure());
        assert!(!StrataError::AuthenticationExpired.is_backend_failure());
    }

    #[test]
    fn test_retriable_errors() {
        assert!(StrataError::backend("connection lost").is_retriable());
        assert!(StrataError::Timeout("request timed out".to_string()).is_retriable());
        assert!(!StrataError::Serialization("bad".to_string()).is_retriable());
        assert!(!StrataError::invalid_argument("bad").is_retriable());
    }

    #[test]
    fn test_json_error_conversion() {
        let err: StrataError = serde_json::from_str::<u32>("not json").unwrap_err().into();
        assert!(matches!(err, StrataError::Serialization(_)));
        assert!(err.to_string().contains("JSON"));
    }

    #[test]
    fn test_error_display() {
        let err = StrataError::AuthenticationExpired;
        assert_eq!(err.to_string(), "Authentication expired");
    }
}
