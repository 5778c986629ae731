//! Middleware for the web UI.

pub mod auth;
pub mod security;

pub use auth::{require_admin, require_authentication, resolve_principal, CurrentUser, Principal};
pub use security::security_headers;
