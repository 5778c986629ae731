//! Web UI for fileshare.
//!
//! Server-rendered pages over cookie sessions. Every state-changing request
//! carries the session's CSRF token.

pub mod error;
pub mod forms;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod server;
pub mod session;
pub mod views;

pub use error::WebError;
pub use handlers::{AppState, WebSettings};
pub use middleware::{CurrentUser, Principal};
pub use router::{create_app, create_router};
pub use server::WebServer;
pub use session::Session;
