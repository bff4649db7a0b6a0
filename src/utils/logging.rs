// Centralized logging utilities to keep log lines consistent across the flow
use chrono::{DateTime, Utc};
use log::{debug, info, warn};

pub struct LoggingHelper;

impl LoggingHelper {
    /// Log the resolved auth service URL
    pub fn log_backend_configured(backend_name: &str, auth_url: &str) {
        info!("🔧 Auth backend '{}' configured at {}", backend_name, auth_url);
    }

    /// Log the client URL used to anchor relative redirects
    pub fn log_client_url(client_url: Option<&str>) {
        match client_url {
            Some(url) => info!("🔗 Relative redirects anchored on {}", url),
            None => info!("🔗 No client URL configured - relative redirects will be dropped"),
        }
    }

    /// Log a relative redirect merged onto the client URL
    pub fn log_redirect_rewritten(original: &str, rewritten: &str) {
        debug!("Rewrote redirect target {} -> {}", original, rewritten);
    }

    /// Log a relative redirect dropped for lack of a client URL
    pub fn log_redirect_dropped(original: &str) {
        warn!("Dropping relative redirect target '{}' - no client URL available", original);
    }

    /// Log a credential that failed its format check (never the value itself)
    pub fn log_credential_rejected(field: &str) {
        debug!("Rejected {} before submission: invalid format", field);
    }

    /// Log a state machine transition
    pub fn log_transition(from: &str, event: &str, to: &str) {
        debug!("Auth state {} --{}--> {}", from, event, to);
    }

    /// Log a rejected state machine transition
    pub fn log_transition_rejected(from: &str, event: &str) {
        warn!("Auth state {} does not accept {}", from, event);
    }

    /// Log session creation success
    pub fn log_session_created(user_email: Option<&str>, expires_at: DateTime<Utc>) {
        info!(
            "Successfully established session for user: {} (access token expires at {})",
            user_email.unwrap_or("<no email>"),
            expires_at.to_rfc3339()
        );
    }

    /// Log session refresh
    pub fn log_session_refreshed(expires_at: DateTime<Utc>) {
        info!("🔄 Session refreshed (access token expires at {})", expires_at.to_rfc3339());
    }

    /// Log a backend call failure
    pub fn log_backend_failure(operation: &str, error: &dyn std::fmt::Display) {
        warn!("❌ {} failed: {}", operation, error);
    }

    /// Log a passwordless or verification email being requested
    pub fn log_email_link_requested(operation: &str, redirect_to: Option<&str>) {
        info!(
            "📧 {} requested (redirect: {})",
            operation,
            redirect_to.unwrap_or("<backend default>")
        );
    }

    /// Log sign out
    pub fn log_signed_out() {
        info!("Signed out - session cleared");
    }
}
