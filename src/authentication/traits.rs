//! Auth backend trait
//!
//! The session manager never talks to the network itself. Requests are handed
//! to an `AuthBackend` implementation supplied by the caller, which is
//! responsible for transport and for mapping server errors into `AuthError`.

use serde::{Deserialize, Serialize};

use crate::models::auth::AuthError;
use crate::models::Session;
use crate::redirect::RedirectOptions;

/// Email + password sign-in payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailPasswordRequest {
    pub email: String,
    pub password: String,
}

/// Passwordless (magic link) sign-in payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordlessEmailRequest {
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<RedirectOptions>,
}

/// Email + password sign-up payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignUpRequest {
    pub email: String,
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<RedirectOptions>,
}

/// Transport to the auth service
///
/// Implementations must be callable from any thread; the session manager
/// holds them behind `Arc<dyn AuthBackend + Send + Sync>`.
pub trait AuthBackend {
    /// Exchange an email and password for a session
    ///
    /// # Errors
    /// Returns an error if the credentials are rejected or the request fails.
    fn sign_in_email_password(&self, request: &EmailPasswordRequest) -> Result<Session, AuthError>;

    /// Ask the backend to email a sign-in link
    ///
    /// # Errors
    /// Returns an error if the request fails.
    fn sign_in_passwordless_email(&self, request: &PasswordlessEmailRequest)
        -> Result<(), AuthError>;

    /// Create an account; `None` when the email must be verified first
    ///
    /// # Errors
    /// Returns an error if the account cannot be created or the request fails.
    fn sign_up_email_password(&self, request: &SignUpRequest) -> Result<Option<Session>, AuthError>;

    /// Exchange a refresh token for a new session
    ///
    /// # Errors
    /// Returns an error if the refresh token is invalid or the request fails.
    fn refresh_session(&self, refresh_token: &str) -> Result<Session, AuthError>;

    /// Revoke a refresh token
    ///
    /// # Errors
    /// Returns an error if the request fails.
    fn sign_out(&self, refresh_token: &str) -> Result<(), AuthError>;

    /// Name used in log lines
    fn backend_name(&self) -> &'static str;
}
