//! Test fixtures providing pre-built test objects

use chrono::{TimeZone, Utc};

use crate::models::{Session, User};
use crate::settings::{AuthSettings, BackendSettings, ClientSettings};

use super::constants::{TEST_ACCESS_TOKEN_TTL, TEST_CLIENT_URL, TEST_EMAIL};

/// Central fixture provider for all test data
pub struct TestFixtures;

impl TestFixtures {
    /// A regular, non-anonymous user
    #[must_use]
    pub fn user() -> User {
        User {
            id: "2c9bd8a8-1b2e-4d6c-9f1d-1e5a3c1f2b3a".to_string(),
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            display_name: TEST_EMAIL.to_string(),
            avatar_url: String::new(),
            locale: "en".to_string(),
            email: Some(TEST_EMAIL.to_string()),
            is_anonymous: false,
            default_role: "user".to_string(),
            roles: vec!["user".to_string(), "me".to_string()],
        }
    }

    /// A session for [`Self::user`] with a 15 minute access token
    #[must_use]
    pub fn session() -> Session {
        Self::session_with_tokens("test-access-token", "test-refresh-token")
    }

    /// A session with specific tokens
    #[must_use]
    pub fn session_with_tokens(access_token: &str, refresh_token: &str) -> Session {
        Session {
            access_token: access_token.to_string(),
            access_token_expires_in: TEST_ACCESS_TOKEN_TTL,
            refresh_token: refresh_token.to_string(),
            user: Self::user(),
        }
    }

    /// A session whose access token lives for `seconds`
    #[must_use]
    pub fn session_expiring_in(seconds: i64) -> Session {
        let mut session = Self::session();
        session.access_token_expires_in = seconds;
        session
    }

    /// Settings pointing at a local backend with a client URL
    #[must_use]
    pub fn settings() -> AuthSettings {
        AuthSettings {
            client: ClientSettings {
                client_url: TEST_CLIENT_URL.to_string(),
            },
            backend: BackendSettings {
                subdomain: Some("localhost".to_string()),
                ..Default::default()
            },
            ..Default::default()
        }
    }
}
