//! Mock backend for isolated testing
//!
//! `MockAuthBackend` answers every request from canned results and records
//! the requests it received.

use std::sync::Mutex;

use crate::authentication::{
    AuthBackend, EmailPasswordRequest, PasswordlessEmailRequest, SignUpRequest,
};
use crate::models::auth::AuthError;
use crate::models::Session;

use super::fixtures::TestFixtures;

/// A request received by the mock backend
#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    SignInEmailPassword(EmailPasswordRequest),
    PasswordlessEmail(PasswordlessEmailRequest),
    SignUp(SignUpRequest),
    RefreshSession(String),
    SignOut(String),
}

/// In-memory backend returning canned results
pub struct MockAuthBackend {
    sign_in: Result<Session, AuthError>,
    passwordless: Result<(), AuthError>,
    sign_up: Result<Option<Session>, AuthError>,
    refresh: Result<Session, AuthError>,
    sign_out: Result<(), AuthError>,
    calls: Mutex<Vec<BackendCall>>,
}

impl Default for MockAuthBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockAuthBackend {
    /// Backend where every request succeeds with fixture sessions
    #[must_use]
    pub fn new() -> Self {
        Self {
            sign_in: Ok(TestFixtures::session()),
            passwordless: Ok(()),
            sign_up: Ok(Some(TestFixtures::session())),
            refresh: Ok(TestFixtures::session_with_tokens(
                "refreshed-access-token",
                "refreshed-refresh-token",
            )),
            sign_out: Ok(()),
            calls: Mutex::new(Vec::new()),
        }
    }

    #[must_use]
    pub fn failing_sign_in(mut self, error: AuthError) -> Self {
        self.sign_in = Err(error);
        self
    }

    #[must_use]
    pub fn failing_passwordless(mut self, error: AuthError) -> Self {
        self.passwordless = Err(error);
        self
    }

    #[must_use]
    pub fn with_sign_up_session(mut self, session: Option<Session>) -> Self {
        self.sign_up = Ok(session);
        self
    }

    #[must_use]
    pub fn with_refresh_session(mut self, session: Session) -> Self {
        self.refresh = Ok(session);
        self
    }

    #[must_use]
    pub fn failing_refresh(mut self, error: AuthError) -> Self {
        self.refresh = Err(error);
        self
    }

    #[must_use]
    pub fn failing_sign_out(mut self, error: AuthError) -> Self {
        self.sign_out = Err(error);
        self
    }

    /// Requests received so far, oldest first
    ///
    /// # Panics
    ///
    /// Panics if the call log mutex is poisoned.
    #[must_use]
    pub fn calls(&self) -> Vec<BackendCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: BackendCall) {
        self.calls.lock().unwrap().push(call);
    }
}

impl AuthBackend for MockAuthBackend {
    fn sign_in_email_password(&self, request: &EmailPasswordRequest) -> Result<Session, AuthError> {
        self.record(BackendCall::SignInEmailPassword(request.clone()));
        self.sign_in.clone()
    }

    fn sign_in_passwordless_email(
        &self,
        request: &PasswordlessEmailRequest,
    ) -> Result<(), AuthError> {
        self.record(BackendCall::PasswordlessEmail(request.clone()));
        self.passwordless.clone()
    }

    fn sign_up_email_password(&self, request: &SignUpRequest) -> Result<Option<Session>, AuthError> {
        self.record(BackendCall::SignUp(request.clone()));
        self.sign_up.clone()
    }

    fn refresh_session(&self, refresh_token: &str) -> Result<Session, AuthError> {
        self.record(BackendCall::RefreshSession(refresh_token.to_string()));
        self.refresh.clone()
    }

    fn sign_out(&self, refresh_token: &str) -> Result<(), AuthError> {
        self.record(BackendCall::SignOut(refresh_token.to_string()));
        self.sign_out.clone()
    }

    fn backend_name(&self) -> &'static str {
        "mock"
    }
}
