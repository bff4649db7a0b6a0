//! Authentication state machine
//!
//! The client is always in exactly one `AuthState`. Every change goes through
//! `AuthState::transition`, which either returns the next state or rejects the
//! event without side effects.

use chrono::{DateTime, Duration, Utc};

use crate::models::auth::AuthError;
use crate::models::{Session, User};
use crate::utils::logging::LoggingHelper;

/// A session together with the moment its access token expires
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveSession {
    pub session: Session,
    pub expires_at: DateTime<Utc>,
}

impl ActiveSession {
    /// Wrap a session received at `received_at`
    #[must_use]
    pub fn new(session: Session, received_at: DateTime<Utc>) -> Self {
        let expires_at = session.access_token_expires_at(received_at);
        Self {
            session,
            expires_at,
        }
    }

    #[must_use]
    pub fn access_token(&self) -> &str {
        &self.session.access_token
    }

    #[must_use]
    pub fn refresh_token(&self) -> &str {
        &self.session.refresh_token
    }

    #[must_use]
    pub fn user(&self) -> &User {
        &self.session.user
    }

    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// True when the access token has expired or expires within `margin` of `now`
    #[must_use]
    pub fn needs_refresh(&self, now: DateTime<Utc>, margin: Duration) -> bool {
        self.is_expired(now)
            || now
                .checked_add_signed(margin)
                .map_or(true, |deadline| deadline >= self.expires_at)
    }
}

/// States of the authentication flow
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AuthState {
    #[default]
    SignedOut,
    Authenticating,
    Authenticated(ActiveSession),
    Refreshing(ActiveSession),
    Error(AuthError),
}

/// Inputs to the state machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    /// A sign-in or sign-up request is about to be sent
    SignInRequested,
    /// The backend issued a session
    SessionReceived(ActiveSession),
    /// The request succeeded but the user must follow an emailed link first
    SignInPending,
    /// The access token is about to be renewed
    RefreshRequested,
    /// The pending request failed
    Failed(AuthError),
    SignOutRequested,
}

impl AuthEvent {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            AuthEvent::SignInRequested => "SignInRequested",
            AuthEvent::SessionReceived(_) => "SessionReceived",
            AuthEvent::SignInPending => "SignInPending",
            AuthEvent::RefreshRequested => "RefreshRequested",
            AuthEvent::Failed(_) => "Failed",
            AuthEvent::SignOutRequested => "SignOutRequested",
        }
    }
}

impl AuthState {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            AuthState::SignedOut => "SignedOut",
            AuthState::Authenticating => "Authenticating",
            AuthState::Authenticated(_) => "Authenticated",
            AuthState::Refreshing(_) => "Refreshing",
            AuthState::Error(_) => "Error",
        }
    }

    /// Session currently held, if any (also while refreshing)
    #[must_use]
    pub fn session(&self) -> Option<&ActiveSession> {
        match self {
            AuthState::Authenticated(session) | AuthState::Refreshing(session) => Some(session),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthState::Authenticated(_) | AuthState::Refreshing(_))
    }

    #[must_use]
    pub fn error(&self) -> Option<&AuthError> {
        match self {
            AuthState::Error(error) => Some(error),
            _ => None,
        }
    }

    /// Apply `event` and return the next state
    ///
    /// # Errors
    ///
    /// Returns `AuthError::AlreadySignedIn` for a sign-in while a session is
    /// held, and `AuthError::InvalidTransition` for any other event the
    /// current state does not accept.
    pub fn transition(self, event: AuthEvent) -> Result<AuthState, AuthError> {
        let from = self.name();
        let event_name = event.name();

        let next = match (self, event) {
            (_, AuthEvent::SignOutRequested) => AuthState::SignedOut,

            (AuthState::SignedOut | AuthState::Error(_), AuthEvent::SignInRequested) => {
                AuthState::Authenticating
            }
            (
                AuthState::Authenticated(_) | AuthState::Refreshing(_),
                AuthEvent::SignInRequested,
            ) => {
                LoggingHelper::log_transition_rejected(from, event_name);
                return Err(AuthError::AlreadySignedIn);
            }

            (
                AuthState::Authenticating | AuthState::Refreshing(_),
                AuthEvent::SessionReceived(session),
            ) => AuthState::Authenticated(session),
            (AuthState::Authenticating, AuthEvent::SignInPending) => AuthState::SignedOut,
            (AuthState::Authenticated(session), AuthEvent::RefreshRequested) => {
                AuthState::Refreshing(session)
            }
            (AuthState::Authenticating | AuthState::Refreshing(_), AuthEvent::Failed(error)) => {
                AuthState::Error(error)
            }

            _ => {
                LoggingHelper::log_transition_rejected(from, event_name);
                return Err(AuthError::InvalidTransition {
                    from,
                    event: event_name,
                });
            }
        };

        LoggingHelper::log_transition(from, event_name, next.name());
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures::TestFixtures;

    fn active() -> ActiveSession {
        ActiveSession::new(TestFixtures::session(), Utc::now())
    }

    #[test]
    fn test_sign_in_success_path() {
        let state = AuthState::SignedOut
            .transition(AuthEvent::SignInRequested)
            .unwrap();
        assert_eq!(state, AuthState::Authenticating);

        let session = active();
        let state = state
            .transition(AuthEvent::SessionReceived(session.clone()))
            .unwrap();
        assert_eq!(state, AuthState::Authenticated(session));
        assert!(state.is_authenticated());
    }

    #[test]
    fn test_sign_in_rejected_when_authenticated() {
        let result = AuthState::Authenticated(active()).transition(AuthEvent::SignInRequested);
        assert_eq!(result, Err(AuthError::AlreadySignedIn));

        let result = AuthState::Refreshing(active()).transition(AuthEvent::SignInRequested);
        assert_eq!(result, Err(AuthError::AlreadySignedIn));
    }

    #[test]
    fn test_failure_moves_to_error_and_allows_retry() {
        let state = AuthState::Authenticating
            .transition(AuthEvent::Failed(AuthError::InvalidEmail))
            .unwrap();
        assert_eq!(state.error(), Some(&AuthError::InvalidEmail));

        let state = state.transition(AuthEvent::SignInRequested).unwrap();
        assert_eq!(state, AuthState::Authenticating);
    }

    #[test]
    fn test_pending_sign_in_returns_to_signed_out() {
        let state = AuthState::Authenticating
            .transition(AuthEvent::SignInPending)
            .unwrap();
        assert_eq!(state, AuthState::SignedOut);
    }

    #[test]
    fn test_refresh_cycle() {
        let original = active();
        let state = AuthState::Authenticated(original.clone())
            .transition(AuthEvent::RefreshRequested)
            .unwrap();
        assert_eq!(state, AuthState::Refreshing(original.clone()));
        assert_eq!(state.session(), Some(&original));

        let renewed = active();
        let state = state
            .transition(AuthEvent::SessionReceived(renewed.clone()))
            .unwrap();
        assert_eq!(state, AuthState::Authenticated(renewed));
    }

    #[test]
    fn test_sign_out_from_every_state() {
        let states = [
            AuthState::SignedOut,
            AuthState::Authenticating,
            AuthState::Authenticated(active()),
            AuthState::Refreshing(active()),
            AuthState::Error(AuthError::InvalidPassword),
        ];

        for state in states {
            assert_eq!(
                state.transition(AuthEvent::SignOutRequested),
                Ok(AuthState::SignedOut)
            );
        }
    }

    #[test]
    fn test_invalid_transitions_are_rejected() {
        assert_eq!(
            AuthState::SignedOut.transition(AuthEvent::RefreshRequested),
            Err(AuthError::InvalidTransition {
                from: "SignedOut",
                event: "RefreshRequested",
            })
        );
        assert!(AuthState::SignedOut
            .transition(AuthEvent::SessionReceived(active()))
            .is_err());
        assert!(AuthState::Authenticated(active())
            .transition(AuthEvent::Failed(AuthError::NotAuthenticated))
            .is_err());
    }

    #[test]
    fn test_needs_refresh_within_margin() {
        let now = Utc::now();
        let session = ActiveSession::new(TestFixtures::session_expiring_in(60), now);

        assert!(!session.needs_refresh(now, Duration::seconds(30)));
        assert!(session.needs_refresh(now, Duration::seconds(60)));
        assert!(!session.is_expired(now));
        assert!(session.is_expired(now + Duration::seconds(60)));
    }

    #[test]
    fn test_needs_refresh_near_time_bounds() {
        let now = Utc::now();
        let forever = ActiveSession::new(TestFixtures::session_expiring_in(i64::MAX), now);
        assert_eq!(forever.expires_at, DateTime::<Utc>::MAX_UTC);
        assert!(!forever.is_expired(now));
        assert!(!forever.needs_refresh(now, Duration::seconds(300)));

        // A margin reaching past the representable range is always due
        let session = ActiveSession::new(TestFixtures::session_expiring_in(60), now);
        assert!(session.needs_refresh(DateTime::<Utc>::MAX_UTC, Duration::seconds(1)));

        // An expired token is due even with a negative margin
        assert!(session.needs_refresh(now + Duration::seconds(120), Duration::seconds(-600)));
    }
}
