//! Cookie sessions on `tower-sessions`, stored in SQLite.
//!
//! [`Session`] wraps the per-request session with the three keys the UI
//! uses: the signed-in user id, a one-shot flash message and the CSRF token.
//! Nothing is written until one of them is set, so anonymous page views do
//! not create session rows.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use time::Duration;
use tower_sessions::cookie::SameSite;
use tower_sessions::{Expiry, SessionManagerLayer};
use tower_sessions_sqlx_store::SqliteStore;

use crate::auth::random_token;
use crate::web::error::WebError;
use crate::web::handlers::WebSettings;

const USER_ID_KEY: &str = "user_id";
const FLASH_KEY: &str = "flash";
const CSRF_KEY: &str = "csrf_token";

impl From<tower_sessions::session::Error> for WebError {
    fn from(e: tower_sessions::session::Error) -> Self {
        WebError::internal(format!("session: {e}"))
    }
}

/// Session layer for the router.
///
/// The cookie is HttpOnly, SameSite=Lax and scoped to `/`. Sessions expire
/// after `session_lifetime_hours` without a request.
pub fn session_layer(store: SqliteStore, settings: &WebSettings) -> SessionManagerLayer<SqliteStore> {
    SessionManagerLayer::new(store)
        .with_name(settings.cookie_name.clone())
        .with_secure(settings.secure_cookie)
        .with_http_only(true)
        .with_same_site(SameSite::Lax)
        .with_path("/")
        .with_expiry(Expiry::OnInactivity(Duration::hours(
            settings.session_lifetime_hours,
        )))
}

/// Handle to the current request's session.
#[derive(Debug, Clone)]
pub struct Session(tower_sessions::Session);

impl Session {
    pub fn new(inner: tower_sessions::Session) -> Self {
        Self(inner)
    }

    /// Authenticated user id.
    pub async fn user_id(&self) -> Result<Option<i64>, WebError> {
        Ok(self.0.get::<i64>(USER_ID_KEY).await?)
    }

    /// CSRF token to embed in forms, created on first use.
    pub async fn csrf_token(&self) -> Result<String, WebError> {
        if let Some(token) = self.0.get::<String>(CSRF_KEY).await? {
            return Ok(token);
        }
        let token = random_token();
        self.0.insert(CSRF_KEY, &token).await?;
        Ok(token)
    }

    /// Reject a submitted CSRF token that does not match the session.
    pub async fn verify_csrf(&self, submitted: &str) -> Result<(), WebError> {
        let expected = self.0.get::<String>(CSRF_KEY).await?.unwrap_or_default();
        let matches = expected.len() == submitted.len()
            && expected
                .bytes()
                .zip(submitted.bytes())
                .fold(0u8, |acc, (a, b)| acc | (a ^ b))
                == 0;
        if matches && !expected.is_empty() {
            Ok(())
        } else {
            Err(WebError::bad_request("CSRF token mismatch"))
        }
    }

    /// Queue a message for the next rendered page.
    pub async fn set_flash(&self, message: &str) -> Result<(), WebError> {
        Ok(self.0.insert(FLASH_KEY, message).await?)
    }

    /// Remove and return the queued message.
    pub async fn take_flash(&self) -> Result<Option<String>, WebError> {
        let flash = self.0.get::<String>(FLASH_KEY).await?;
        if flash.is_some() {
            self.0.remove::<String>(FLASH_KEY).await?;
        }
        Ok(flash)
    }

    /// Bind the session to a user under a new session id and CSRF token.
    pub async fn log_in(&self, user_id: i64) -> Result<(), WebError> {
        self.0.cycle_id().await?;
        self.0.insert(USER_ID_KEY, user_id).await?;
        self.0.insert(CSRF_KEY, random_token()).await?;
        Ok(())
    }

    /// Drop the user binding under a new session id and CSRF token.
    pub async fn log_out(&self) -> Result<(), WebError> {
        self.0.cycle_id().await?;
        self.0.remove::<i64>(USER_ID_KEY).await?;
        self.0.insert(CSRF_KEY, random_token()).await?;
        Ok(())
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
{
    type Rejection = WebError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<tower_sessions::Session>()
            .cloned()
            .map(Session)
            .ok_or_else(|| WebError::internal("session layer is not installed"))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tower_sessions::MemoryStore;

    use super::*;

    fn session() -> Session {
        Session::new(tower_sessions::Session::new(
            None,
            Arc::new(MemoryStore::default()),
            None,
        ))
    }

    #[tokio::test]
    async fn test_reads_leave_session_empty() {
        let s = session();

        assert!(s.user_id().await.unwrap().is_none());
        assert!(s.take_flash().await.unwrap().is_none());
        assert!(s.verify_csrf("anything").await.is_err());

        assert!(s.0.is_empty().await);
    }

    #[tokio::test]
    async fn test_csrf_token_is_stable() {
        let s = session();
        let token = s.csrf_token().await.unwrap();

        assert_eq!(token.len(), 32);
        assert_eq!(s.csrf_token().await.unwrap(), token);
    }

    #[tokio::test]
    async fn test_verify_csrf() {
        let s = session();
        let token = s.csrf_token().await.unwrap();

        assert!(s.verify_csrf(&token).await.is_ok());
        assert!(s.verify_csrf("").await.is_err());
        assert!(s.verify_csrf("wrong").await.is_err());
        assert!(s.verify_csrf(&format!("{token}x")).await.is_err());
    }

    #[tokio::test]
    async fn test_flash_is_taken_once() {
        let s = session();
        s.set_flash("File successfully uploaded!").await.unwrap();

        assert_eq!(
            s.take_flash().await.unwrap().as_deref(),
            Some("File successfully uploaded!")
        );
        assert!(s.take_flash().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_log_in_rotates_csrf_token() {
        let s = session();
        let before = s.csrf_token().await.unwrap();

        s.log_in(5).await.unwrap();

        assert_eq!(s.user_id().await.unwrap(), Some(5));
        assert_ne!(s.csrf_token().await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_log_out_clears_user() {
        let s = session();
        s.log_in(5).await.unwrap();
        s.log_out().await.unwrap();

        assert!(s.user_id().await.unwrap().is_none());
        assert!(!s.csrf_token().await.unwrap().is_empty());
    }
}
