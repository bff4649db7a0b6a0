//! Session Management Module
//!
//! # Modules
//!
//! - [`state`] - Authentication states, events and transitions
//! - [`manager`] - Session manager owning the state and driving the backend

pub mod manager;
pub mod state;

// Re-export commonly used items for convenience
pub use manager::SessionManager;
pub use state::{ActiveSession, AuthEvent, AuthState};
