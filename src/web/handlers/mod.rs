//! Request handlers for the web UI.

pub mod auth;
pub mod file;
pub mod home;
pub mod user;

pub use auth::*;
pub use file::*;
pub use home::*;
pub use user::*;

use std::sync::Arc;

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};

use crate::config::Config;
use crate::db::Database;
use crate::file::FileStorage;
use crate::mail::Mailer;
use crate::web::error::WebError;
use crate::web::middleware::Principal;
use crate::web::session::Session;
use crate::web::views::PageContext;

/// Request-independent settings the handlers need.
#[derive(Debug, Clone)]
pub struct WebSettings {
    /// Name of the session cookie.
    pub cookie_name: String,
    /// Session lifetime in hours.
    pub session_lifetime_hours: i64,
    /// Mark the session cookie `Secure`.
    pub secure_cookie: bool,
    /// Expiry pre-filled on the upload form.
    pub default_expiry_days: i64,
    /// Files shown on the administrator's home page.
    pub listing_limit: i64,
    /// Request body limit for uploads, in bytes.
    pub max_upload_bytes: usize,
    /// Public URL used in notification links.
    pub base_url: String,
    /// Timezone for displayed dates.
    pub timezone: String,
}

impl WebSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            cookie_name: config.session.cookie_name.clone(),
            session_lifetime_hours: config.session.lifetime_hours,
            secure_cookie: config.session.secure_cookie,
            default_expiry_days: config.files.default_expiry_days,
            listing_limit: config.files.listing_limit,
            max_upload_bytes: usize::try_from(config.files.max_upload_size_mb)
                .unwrap_or(usize::MAX / (1024 * 1024))
                .saturating_mul(1024 * 1024),
            base_url: config.server.base_url.clone(),
            timezone: config.server.timezone.clone(),
        }
    }
}

impl Default for WebSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Application state shared by all handlers.
pub struct AppState {
    /// Database handle.
    pub db: Database,
    /// Blob storage for uploaded files.
    pub storage: FileStorage,
    /// Notification delivery.
    pub mailer: Arc<dyn Mailer>,
    /// Web settings.
    pub settings: WebSettings,
}

impl AppState {
    /// Create a new application state.
    pub fn new(
        db: Database,
        storage: FileStorage,
        mailer: Arc<dyn Mailer>,
        settings: WebSettings,
    ) -> Self {
        Self {
            db,
            storage,
            mailer,
            settings,
        }
    }

    /// Layout data for a page render; consumes the pending flash.
    ///
    /// Anonymous visitors get no CSRF token, so a plain page view leaves
    /// their session empty. Pages with forms use [`AppState::form_page`].
    pub async fn page(&self, session: &Session, principal: &Principal) -> Result<PageContext, WebError> {
        let csrf_token = if principal.is_authenticated() {
            session.csrf_token().await?
        } else {
            String::new()
        };
        self.context(session, principal, csrf_token).await
    }

    /// Layout data for a page that posts a form.
    pub async fn form_page(&self, session: &Session, principal: &Principal) -> Result<PageContext, WebError> {
        let csrf_token = session.csrf_token().await?;
        self.context(session, principal, csrf_token).await
    }

    async fn context(
        &self,
        session: &Session,
        principal: &Principal,
        csrf_token: String,
    ) -> Result<PageContext, WebError> {
        Ok(PageContext {
            flash: session.take_flash().await?,
            csrf_token,
            principal: principal.clone(),
            timezone: self.settings.timezone.clone(),
        })
    }
}

/// Render an HTML page with a status.
pub(crate) fn render(status: StatusCode, html: String) -> Response {
    (status, Html(html)).into_response()
}

/// Parse a numeric path id. Anything but a positive integer is a 404.
pub(crate) fn parse_id(raw: &str) -> Result<i64, WebError> {
    raw.parse::<i64>()
        .ok()
        .filter(|id| *id >= 1)
        .ok_or_else(|| WebError::not_found(format!("invalid id {raw:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id("1").unwrap(), 1);
        assert_eq!(parse_id("42").unwrap(), 42);

        for raw in ["0", "-1", "1.23", "foo", "", "99999999999999999999"] {
            assert!(parse_id(raw).is_err(), "{raw} accepted");
        }
    }

    #[test]
    fn test_settings_from_config() {
        let settings = WebSettings::default();
        assert_eq!(settings.cookie_name, "fileshare_session");
        assert_eq!(settings.session_lifetime_hours, 12);
        assert_eq!(settings.default_expiry_days, 365);
        assert_eq!(settings.listing_limit, 10);
        assert_eq!(settings.max_upload_bytes, 25 * 1024 * 1024);
    }
}
