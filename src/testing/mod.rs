//! Testing utilities for authflow
//!
//! Shared fixtures and a mock backend so unit tests and integration tests
//! build sessions and managers the same way.
//!
//! ## Organization
//!
//! - [`fixtures`] - Pre-built test data (users, sessions, settings)
//! - [`mock`] - In-memory `AuthBackend` that records every call
//!
//! ## Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use authflow::testing::{fixtures::TestFixtures, mock::MockAuthBackend};
//! use authflow::SessionManager;
//!
//! let backend = Arc::new(MockAuthBackend::new());
//! let mut manager = SessionManager::from_settings(&TestFixtures::settings(), backend).unwrap();
//! manager.sign_in_email_password("test@example.com", "test-password").unwrap();
//! assert!(manager.is_authenticated());
//! ```

pub mod fixtures;
pub mod mock;

pub use fixtures::TestFixtures;
pub use mock::{BackendCall, MockAuthBackend};

/// Common test constants
pub mod constants {
    /// Default test email address
    pub const TEST_EMAIL: &str = "test@example.com";

    /// Default test password
    pub const TEST_PASSWORD: &str = "test-password";

    /// Client URL used by the default test settings
    pub const TEST_CLIENT_URL: &str = "https://frontend.com";

    /// Auth URL resolved from the default test settings
    pub const TEST_AUTH_URL: &str = "http://localhost:1337/v1/auth";

    /// Access token lifetime of fixture sessions, in seconds
    pub const TEST_ACCESS_TOKEN_TTL: i64 = 900;
}
