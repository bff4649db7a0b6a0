#![warn(clippy::pedantic)]
#![warn(clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

/// Version of the authflow library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod authentication;
pub mod models;
pub mod redirect;
pub mod session;
pub mod settings;
pub mod utils;
pub mod validation;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

/// Re-export commonly used items
pub use authentication::AuthBackend;
pub use models::auth::{AuthError, ErrorPayload};
pub use models::{Session, User};
pub use redirect::{rewrite_redirect_to, RedirectOptions};
pub use session::{AuthState, SessionManager};
pub use settings::AuthSettings;
pub use utils::query::encode_query_parameters;
pub use validation::{is_valid_email, is_valid_password};
