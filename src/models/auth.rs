//! Common authentication error types
//!
//! This module provides the error type shared by credential validation, the
//! authentication state machine and the session manager, together with the
//! wire payload the auth client reports to its callers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Status used by the auth client for input validation failures
pub const VALIDATION_ERROR_STATUS: u16 = 10;

/// Status used when the backend could not be reached
pub const NETWORK_ERROR_STATUS: u16 = 0;

/// Error object reported to callers of the auth client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub status: u16,
    pub error: String,
    pub message: String,
}

/// Common error type for authentication operations
///
/// Validation, state machine and backend failures are unified here so the
/// session manager can store the last failure inside its `Error` state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Email failed the format check
    InvalidEmail,
    /// Password failed the configured policy
    InvalidPassword,
    /// A sign-in was attempted while a session is active
    AlreadySignedIn,
    /// The operation needs an authenticated session
    NotAuthenticated,
    /// The state machine has no edge for this event
    InvalidTransition {
        from: &'static str,
        event: &'static str,
    },
    /// Failure reported by the backend
    Backend {
        status: u16,
        error: String,
        message: String,
    },
    /// Invalid or incomplete client configuration
    Configuration(String),
}

impl AuthError {
    /// Machine-readable error code, as sent in `ErrorPayload::error`
    #[must_use]
    pub fn code(&self) -> &str {
        match self {
            AuthError::InvalidEmail => "invalid-email",
            AuthError::InvalidPassword => "invalid-password",
            AuthError::AlreadySignedIn => "already-signed-in",
            AuthError::NotAuthenticated => "unauthenticated-user",
            AuthError::InvalidTransition { .. } => "invalid-transition",
            AuthError::Backend { error, .. } => error,
            AuthError::Configuration(_) => "invalid-configuration",
        }
    }

    /// Numeric status, as sent in `ErrorPayload::status`
    #[must_use]
    pub fn status(&self) -> u16 {
        match self {
            AuthError::Backend { status, .. } => *status,
            _ => VALIDATION_ERROR_STATUS,
        }
    }

    /// Build the payload reported to callers
    #[must_use]
    pub fn payload(&self) -> ErrorPayload {
        let message = match self {
            AuthError::Backend { message, .. } => message.clone(),
            other => other.to_string(),
        };
        ErrorPayload {
            status: self.status(),
            error: self.code().to_string(),
            message,
        }
    }

    /// Backend failure for a request that never reached the server
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        AuthError::Backend {
            status: NETWORK_ERROR_STATUS,
            error: "network".to_string(),
            message: message.into(),
        }
    }
}

impl From<ErrorPayload> for AuthError {
    fn from(payload: ErrorPayload) -> Self {
        AuthError::Backend {
            status: payload.status,
            error: payload.error,
            message: payload.message,
        }
    }
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::InvalidEmail => write!(f, "Email is incorrectly formatted"),
            AuthError::InvalidPassword => write!(f, "Password is incorrectly formatted"),
            AuthError::AlreadySignedIn => write!(f, "User is already signed in"),
            AuthError::NotAuthenticated => write!(f, "User is not authenticated"),
            AuthError::InvalidTransition { from, event } => {
                write!(f, "Invalid transition: {event} is not accepted in state {from}")
            }
            AuthError::Backend { status, error, message } => {
                write!(f, "Backend error {status} ({error}): {message}")
            }
            AuthError::Configuration(msg) => write!(f, "Configuration error: {msg}"),
        }
    }
}

impl std::error::Error for AuthError {}
