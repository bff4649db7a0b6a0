//! Validation Module
//!
//! Input checks that run before anything is sent to the auth backend.
//!
//! # Modules
//!
//! - [`credentials`] - Email and password format checks
//!
//! # Usage
//!
//! ```rust
//! use serde_json::json;
//! use authflow::validation::{is_valid_email, is_valid_password};
//!
//! assert!(is_valid_email(&json!("user+label@example.com")));
//! assert!(!is_valid_password(&json!("ab")));
//! ```

pub mod credentials;

// Re-export commonly used items for convenience
pub use credentials::{
    is_email, is_password, is_valid_email, is_valid_password, CredentialValidator,
    PasswordPolicy, DEFAULT_MIN_PASSWORD_LENGTH,
};
