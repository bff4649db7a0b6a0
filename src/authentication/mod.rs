//! Authentication transport abstraction
//!
//! - [`traits`] - The `AuthBackend` trait and its request payloads

pub mod traits;

pub use traits::{AuthBackend, EmailPasswordRequest, PasswordlessEmailRequest, SignUpRequest};
