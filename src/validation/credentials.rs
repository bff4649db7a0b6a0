//! Credential format checks
//!
//! These predicates run before a sign-in or sign-up request is built. They
//! accept any JSON value so that untyped form input can be checked directly;
//! anything that is not a string is rejected.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::models::auth::AuthError;
use crate::utils::logging::LoggingHelper;

/// Minimum password length accepted when no policy is configured
pub const DEFAULT_MIN_PASSWORD_LENGTH: usize = 3;

// Dot-separated (or quoted) local part, then a bracketed IPv4 literal or a
// dotted domain whose last label has at least two letters.
static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?i)^(?:(?:[^<>()\[\]\\.,;:\s@"]+(?:\.[^<>()\[\]\\.,;:\s@"]+)*)|(?:".+"))@(?:(?:\[[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}\])|(?:(?:[a-z\-0-9]+\.)+[a-z]{2,}))$"#,
    )
    .unwrap()
});

/// Check whether an arbitrary value is a well-formed email address
#[must_use]
pub fn is_valid_email(value: &Value) -> bool {
    value.as_str().is_some_and(is_email)
}

/// Check whether a string is a well-formed email address
#[must_use]
pub fn is_email(candidate: &str) -> bool {
    EMAIL_PATTERN.is_match(candidate)
}

/// Check whether an arbitrary value satisfies the default password policy
#[must_use]
pub fn is_valid_password(value: &Value) -> bool {
    PasswordPolicy::default().accepts(value)
}

/// Check whether a string satisfies the default password policy
#[must_use]
pub fn is_password(candidate: &str) -> bool {
    PasswordPolicy::default().accepts_str(candidate)
}

/// Password acceptance rules
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordPolicy {
    /// Minimum number of characters (Unicode scalar values)
    pub min_length: usize,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            min_length: DEFAULT_MIN_PASSWORD_LENGTH,
        }
    }
}

impl PasswordPolicy {
    #[must_use]
    pub fn new(min_length: usize) -> Self {
        Self { min_length }
    }

    /// Check an arbitrary value against this policy
    #[must_use]
    pub fn accepts(&self, value: &Value) -> bool {
        value.as_str().is_some_and(|s| self.accepts_str(s))
    }

    /// Check a string against this policy
    #[must_use]
    pub fn accepts_str(&self, candidate: &str) -> bool {
        !candidate.is_empty() && candidate.chars().count() >= self.min_length
    }
}

/// Credential checks that report failures as `AuthError`
#[derive(Debug, Clone, Copy, Default)]
pub struct CredentialValidator {
    password_policy: PasswordPolicy,
}

impl CredentialValidator {
    #[must_use]
    pub fn new(password_policy: PasswordPolicy) -> Self {
        Self { password_policy }
    }

    #[must_use]
    pub fn password_policy(&self) -> PasswordPolicy {
        self.password_policy
    }

    /// Validate an email address
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the address is malformed.
    pub fn validate_email(&self, email: &str) -> Result<(), AuthError> {
        if is_email(email) {
            Ok(())
        } else {
            LoggingHelper::log_credential_rejected("email");
            Err(AuthError::InvalidEmail)
        }
    }

    /// Validate a password against the configured policy
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidPassword` if the password is too short.
    pub fn validate_password(&self, password: &str) -> Result<(), AuthError> {
        if self.password_policy.accepts_str(password) {
            Ok(())
        } else {
            LoggingHelper::log_credential_rejected("password");
            Err(AuthError::InvalidPassword)
        }
    }

    /// Validate an email and password pair, email first
    ///
    /// # Errors
    ///
    /// Returns the first failing check.
    pub fn validate_email_password(&self, email: &str, password: &str) -> Result<(), AuthError> {
        self.validate_email(email)?;
        self.validate_password(password)
    }
}
