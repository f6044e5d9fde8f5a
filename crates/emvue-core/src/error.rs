//! Error types for the emvue library.
//!
//! This module provides a unified error type with explicit variants for
//! transport, authentication, API, and input validation failures, so callers
//! can distinguish "supply credentials first" from "the provider rejected
//! you" from "the upstream kept falling over".

use thiserror::Error;

/// The unified error type for emvue operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Network transport errors (DNS, TLS, connection, timeout).
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Authentication errors (missing or rejected credentials).
    #[error("authentication error: {0}")]
    Auth(#[from] AuthError),

    /// API errors (unexpected status, undecodable responses).
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Input validation errors (invalid API URL).
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InvalidInputError),

    /// The retry budget was exhausted against server errors.
    #[error("request failed after {attempts} attempts")]
    RetriesExhausted { attempts: u32 },
}

/// Transport-level errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Network connection failed.
    #[error("connection failed: {message}")]
    Connection { message: String },

    /// Request timed out.
    #[error("request timed out: {message}")]
    Timeout { message: String },

    /// Generic HTTP error.
    #[error("HTTP error: {message}")]
    Http { message: String },
}

#[cfg(feature = "reqwest")]
impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout {
                message: err.to_string(),
            }
        } else if err.is_connect() {
            TransportError::Connection {
                message: err.to_string(),
            }
        } else {
            TransportError::Http {
                message: err.to_string(),
            }
        }
    }
}

#[cfg(feature = "reqwest")]
impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Transport(TransportError::from(err))
    }
}

/// Authentication-related errors.
#[derive(Debug, Error)]
pub enum AuthError {
    /// No credential material is available at all. The caller must supply a
    /// password or a stored refresh credential before retrying.
    #[error("not authenticated; incorrect username or password?")]
    NotAuthenticated,

    /// The identity provider rejected the principal.
    #[error("identity provider rejected the credentials: {message}")]
    Rejected { message: String },

    /// The access token could not be decoded structurally.
    #[error("malformed access token: {reason}")]
    MalformedToken { reason: String },
}

/// API-level errors raised by the typed client layer.
///
/// The dispatcher itself returns non-401 4xx responses as normal responses;
/// these variants appear only when a typed accessor refuses to decode one.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The server answered with a non-success status.
    #[error("server returned status {status}")]
    Status { status: u16, message: Option<String> },

    /// The response body did not match the expected shape.
    #[error("failed to decode response body: {message}")]
    Decode { message: String },
}

/// Input validation errors.
#[derive(Debug, Error)]
pub enum InvalidInputError {
    /// Invalid API base URL.
    #[error("invalid API URL '{value}': {reason}")]
    ApiUrl { value: String, reason: String },

    /// Generic invalid input.
    #[error("invalid input: {message}")]
    Other { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retries_exhausted_names_attempt_count() {
        let err = Error::RetriesExhausted { attempts: 5 };
        assert_eq!(err.to_string(), "request failed after 5 attempts");
    }

    #[test]
    fn auth_errors_are_distinguishable() {
        let missing = Error::Auth(AuthError::NotAuthenticated);
        let rejected = Error::Auth(AuthError::Rejected {
            message: "bad password".into(),
        });
        assert!(matches!(missing, Error::Auth(AuthError::NotAuthenticated)));
        assert!(matches!(rejected, Error::Auth(AuthError::Rejected { .. })));
    }
}
