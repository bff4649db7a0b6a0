//! Session Manager - explicit owner of the authentication state
//!
//! The `SessionManager` is the single place where the client's `AuthState`
//! lives. It validates credentials, rewrites redirect targets, drives the
//! state machine and delegates every network request to an injected
//! `AuthBackend`.
//!
//! ## Organization
//!
//! 1. **Construction** - building a manager from explicit values or settings
//! 2. **Sign in / sign up** - credential and passwordless flows
//! 3. **Refresh and sign out** - session lifecycle after authentication
//! 4. **Provider URLs** - pure URL building for provider sign-in
//! 5. **Accessors** - read-only views of the current state

use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

use crate::authentication::{
    AuthBackend, EmailPasswordRequest, PasswordlessEmailRequest, SignUpRequest,
};
use crate::models::auth::AuthError;
use crate::models::{Session, User};
use crate::redirect::{rewrite_redirect_to, RedirectOptions};
use crate::session::state::{ActiveSession, AuthEvent, AuthState};
use crate::settings::AuthSettings;
use crate::utils::logging::LoggingHelper;
use crate::utils::query::encode_query_parameters;
use crate::validation::{CredentialValidator, PasswordPolicy};

/// Owner of the authentication state for one client
pub struct SessionManager {
    backend: Arc<dyn AuthBackend + Send + Sync>,
    auth_url: String,
    client_url: Option<String>,
    validator: CredentialValidator,
    refresh_margin: Option<Duration>,
    state: AuthState,
}

// =============================================================================
// 1. Construction
// =============================================================================

impl SessionManager {
    /// Create a signed-out manager with the default password policy and a
    /// five minute refresh margin
    #[must_use]
    pub fn new(
        backend: Arc<dyn AuthBackend + Send + Sync>,
        auth_url: impl Into<String>,
        client_url: Option<String>,
    ) -> Self {
        Self {
            backend,
            auth_url: auth_url.into(),
            client_url: client_url.filter(|url| !url.is_empty()),
            validator: CredentialValidator::default(),
            refresh_margin: Some(Duration::minutes(5)),
            state: AuthState::SignedOut,
        }
    }

    /// Create a manager configured from settings
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the backend location cannot be resolved.
    pub fn from_settings(
        settings: &AuthSettings,
        backend: Arc<dyn AuthBackend + Send + Sync>,
    ) -> Result<Self, AuthError> {
        let auth_url = settings.auth_url()?;
        LoggingHelper::log_backend_configured(backend.backend_name(), &auth_url);
        LoggingHelper::log_client_url(settings.client_url());

        Ok(Self::new(
            backend,
            auth_url,
            settings.client_url().map(ToString::to_string),
        )
        .with_password_policy(settings.password_policy())
        .with_refresh_margin(settings.refresh_margin()))
    }

    #[must_use]
    pub fn with_password_policy(mut self, policy: PasswordPolicy) -> Self {
        self.validator = CredentialValidator::new(policy);
        self
    }

    /// Set the automatic refresh margin; `None` disables `refresh_if_needed`
    #[must_use]
    pub fn with_refresh_margin(mut self, margin: Option<Duration>) -> Self {
        self.refresh_margin = margin;
        self
    }
}

// =============================================================================
// 2. Sign in / sign up
// =============================================================================

impl SessionManager {
    /// Sign in with an email and password
    ///
    /// # Errors
    ///
    /// Returns `AuthError::AlreadySignedIn` when a session is held (state is
    /// left untouched), a validation error for malformed credentials, or the
    /// backend's error. Validation and backend failures leave the manager in
    /// the `Error` state.
    pub fn sign_in_email_password(
        &mut self,
        email: &str,
        password: &str,
    ) -> Result<Session, AuthError> {
        self.apply(AuthEvent::SignInRequested)?;

        if let Err(error) = self.validator.validate_email_password(email, password) {
            return Err(self.fail(error));
        }

        let request = EmailPasswordRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        match self.backend.sign_in_email_password(&request) {
            Ok(session) => self.accept_session(session, Utc::now()),
            Err(error) => {
                LoggingHelper::log_backend_failure("Email/password sign in", &error);
                Err(self.fail(error))
            }
        }
    }

    /// Request a magic link for `email`
    ///
    /// On success no session is created; the manager returns to `SignedOut`
    /// until the link is followed.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`Self::sign_in_email_password`].
    pub fn sign_in_passwordless_email(
        &mut self,
        email: &str,
        options: Option<RedirectOptions>,
    ) -> Result<(), AuthError> {
        self.apply(AuthEvent::SignInRequested)?;

        if let Err(error) = self.validator.validate_email(email) {
            return Err(self.fail(error));
        }

        let request = PasswordlessEmailRequest {
            email: email.to_string(),
            options: self.rewrite_options(options),
        };
        LoggingHelper::log_email_link_requested(
            "Passwordless sign in",
            redirect_target(request.options.as_ref()),
        );

        match self.backend.sign_in_passwordless_email(&request) {
            Ok(()) => self.apply(AuthEvent::SignInPending),
            Err(error) => {
                LoggingHelper::log_backend_failure("Passwordless sign in", &error);
                Err(self.fail(error))
            }
        }
    }

    /// Create an account with an email and password
    ///
    /// Returns the new session, or `None` when the backend requires the email
    /// to be verified first.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`Self::sign_in_email_password`].
    pub fn sign_up_email_password(
        &mut self,
        email: &str,
        password: &str,
        options: Option<RedirectOptions>,
    ) -> Result<Option<Session>, AuthError> {
        self.apply(AuthEvent::SignInRequested)?;

        if let Err(error) = self.validator.validate_email_password(email, password) {
            return Err(self.fail(error));
        }

        let request = SignUpRequest {
            email: email.to_string(),
            password: password.to_string(),
            options: self.rewrite_options(options),
        };

        match self.backend.sign_up_email_password(&request) {
            Ok(Some(session)) => self.accept_session(session, Utc::now()).map(Some),
            Ok(None) => {
                LoggingHelper::log_email_link_requested(
                    "Email verification",
                    redirect_target(request.options.as_ref()),
                );
                self.apply(AuthEvent::SignInPending)?;
                Ok(None)
            }
            Err(error) => {
                LoggingHelper::log_backend_failure("Sign up", &error);
                Err(self.fail(error))
            }
        }
    }
}

// =============================================================================
// 3. Refresh and sign out
// =============================================================================

impl SessionManager {
    /// Exchange the current refresh token for a new session
    ///
    /// # Errors
    ///
    /// Returns `AuthError::NotAuthenticated` unless the manager is
    /// `Authenticated`, or the backend's error (which moves the manager to
    /// the `Error` state).
    pub fn refresh_session(&mut self) -> Result<Session, AuthError> {
        let refresh_token = match &self.state {
            AuthState::Authenticated(active) => active.refresh_token().to_string(),
            _ => return Err(AuthError::NotAuthenticated),
        };

        self.apply(AuthEvent::RefreshRequested)?;

        match self.backend.refresh_session(&refresh_token) {
            Ok(session) => {
                let session = self.accept_session(session, Utc::now())?;
                if let Some(active) = self.state.session() {
                    LoggingHelper::log_session_refreshed(active.expires_at);
                }
                Ok(session)
            }
            Err(error) => {
                LoggingHelper::log_backend_failure("Token refresh", &error);
                Err(self.fail(error))
            }
        }
    }

    /// Refresh when the access token expires within the configured margin
    ///
    /// Returns whether a refresh was performed.
    ///
    /// # Errors
    ///
    /// Propagates errors from [`Self::refresh_session`].
    pub fn refresh_if_needed(&mut self, now: DateTime<Utc>) -> Result<bool, AuthError> {
        let Some(margin) = self.refresh_margin else {
            return Ok(false);
        };

        let due = match &self.state {
            AuthState::Authenticated(active) => active.needs_refresh(now, margin),
            _ => false,
        };
        if !due {
            return Ok(false);
        }

        self.refresh_session()?;
        Ok(true)
    }

    /// Sign out
    ///
    /// The refresh token is revoked on a best-effort basis; the local state is
    /// always cleared.
    pub fn sign_out(&mut self) {
        if let Some(active) = self.state.session() {
            if let Err(error) = self.backend.sign_out(active.refresh_token()) {
                LoggingHelper::log_backend_failure("Sign out", &error);
            }
        }

        self.state = AuthState::SignedOut;
        LoggingHelper::log_signed_out();
    }
}

// =============================================================================
// 4. Provider URLs
// =============================================================================

impl SessionManager {
    /// URL that starts sign-in with an OAuth provider
    ///
    /// The redirect target is rewritten against the client URL and all
    /// options are encoded as query parameters.
    #[must_use]
    pub fn provider_sign_in_url(&self, provider: &str, options: Option<RedirectOptions>) -> String {
        let base_url = format!("{}/signin/provider/{provider}", self.auth_url);
        let parameters = self.rewrite_options(options).map(|o| o.to_query_map());
        encode_query_parameters(&base_url, parameters.as_ref())
    }

    fn rewrite_options(&self, options: Option<RedirectOptions>) -> Option<RedirectOptions> {
        rewrite_redirect_to(self.client_url.as_deref(), options)
    }
}

// =============================================================================
// 5. Accessors and state plumbing
// =============================================================================

impl SessionManager {
    #[must_use]
    pub fn state(&self) -> &AuthState {
        &self.state
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.state.is_authenticated()
    }

    #[must_use]
    pub fn access_token(&self) -> Option<&str> {
        self.state.session().map(ActiveSession::access_token)
    }

    #[must_use]
    pub fn user(&self) -> Option<&User> {
        self.state.session().map(ActiveSession::user)
    }

    #[must_use]
    pub fn auth_url(&self) -> &str {
        &self.auth_url
    }

    #[must_use]
    pub fn client_url(&self) -> Option<&str> {
        self.client_url.as_deref()
    }

    fn apply(&mut self, event: AuthEvent) -> Result<(), AuthError> {
        self.state = self.state.clone().transition(event)?;
        Ok(())
    }

    /// Record `error` in the state machine and hand it back
    fn fail(&mut self, error: AuthError) -> AuthError {
        if let Err(rejected) = self.apply(AuthEvent::Failed(error.clone())) {
            log::debug!("Failure not recorded in state: {rejected}");
        }
        error
    }

    fn accept_session(
        &mut self,
        session: Session,
        received_at: DateTime<Utc>,
    ) -> Result<Session, AuthError> {
        let active = ActiveSession::new(session.clone(), received_at);
        LoggingHelper::log_session_created(session.user.email.as_deref(), active.expires_at);
        self.apply(AuthEvent::SessionReceived(active))?;
        Ok(session)
    }
}

fn redirect_target(options: Option<&RedirectOptions>) -> Option<&str> {
    options.and_then(|o| o.redirect_to.as_deref())
}
