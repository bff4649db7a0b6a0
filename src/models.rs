use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod auth;

/// User record returned by the auth backend alongside a session
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub display_name: String,
    pub avatar_url: String,
    pub locale: String,
    pub email: Option<String>,
    pub is_anonymous: bool,
    pub default_role: String,
    pub roles: Vec<String>,
}

/// Session issued by the auth backend on sign-in, sign-up or refresh
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub access_token: String,
    /// Lifetime of `access_token` in seconds
    pub access_token_expires_in: i64,
    pub refresh_token: String,
    pub user: User,
}

impl Session {
    /// Absolute expiry of the access token for a session received at `received_at`
    ///
    /// Lifetimes beyond what `DateTime<Utc>` can represent saturate at its
    /// bounds.
    #[must_use]
    pub fn access_token_expires_at(&self, received_at: DateTime<Utc>) -> DateTime<Utc> {
        chrono::Duration::try_seconds(self.access_token_expires_in)
            .and_then(|lifetime| received_at.checked_add_signed(lifetime))
            .unwrap_or(if self.access_token_expires_in < 0 {
                DateTime::<Utc>::MIN_UTC
            } else {
                DateTime::<Utc>::MAX_UTC
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_session_deserializes_from_camel_case() {
        let json = serde_json::json!({
            "accessToken": "token",
            "accessTokenExpiresIn": 900,
            "refreshToken": "refresh",
            "user": {
                "id": "2c9bd8a8-1b2e-4d6c-9f1d-1e5a3c1f2b3a",
                "createdAt": "2024-01-01T00:00:00Z",
                "displayName": "user@example.com",
                "avatarUrl": "",
                "locale": "en",
                "email": "user@example.com",
                "isAnonymous": false,
                "defaultRole": "user",
                "roles": ["user", "me"]
            }
        });

        let session: Session = serde_json::from_value(json).unwrap();
        assert_eq!(session.access_token_expires_in, 900);
        assert_eq!(session.user.locale, "en");
        assert_eq!(session.user.roles, vec!["user", "me"]);
        assert!(!session.user.is_anonymous);
    }

    #[test]
    fn test_access_token_expiry_is_relative_to_receipt() {
        let json = serde_json::json!({
            "accessToken": "token",
            "accessTokenExpiresIn": 60,
            "refreshToken": "refresh",
            "user": {
                "id": "1",
                "createdAt": "2024-01-01T00:00:00Z",
                "displayName": "",
                "avatarUrl": "",
                "locale": "en",
                "email": null,
                "isAnonymous": true,
                "defaultRole": "anonymous",
                "roles": []
            }
        });
        let session: Session = serde_json::from_value(json).unwrap();

        let received = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let expected = Utc.with_ymd_and_hms(2024, 5, 1, 12, 1, 0).unwrap();
        assert_eq!(session.access_token_expires_at(received), expected);
    }

    #[test]
    fn test_out_of_range_lifetime_saturates() {
        let received = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let mut session: Session = serde_json::from_value(serde_json::json!({
            "accessToken": "token",
            "accessTokenExpiresIn": i64::MAX,
            "refreshToken": "refresh",
            "user": {
                "id": "1",
                "createdAt": "2024-01-01T00:00:00Z",
                "displayName": "",
                "avatarUrl": "",
                "locale": "en",
                "email": null,
                "isAnonymous": true,
                "defaultRole": "anonymous",
                "roles": []
            }
        }))
        .unwrap();
        assert_eq!(session.access_token_expires_at(received), DateTime::<Utc>::MAX_UTC);

        session.access_token_expires_in = 9_000_000_000_000_000;
        assert_eq!(session.access_token_expires_at(received), DateTime::<Utc>::MAX_UTC);

        session.access_token_expires_in = i64::MIN;
        assert_eq!(session.access_token_expires_at(received), DateTime::<Utc>::MIN_UTC);
    }
}
