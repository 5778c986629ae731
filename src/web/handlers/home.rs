//! Home page and liveness check.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::Response};

use super::{render, AppState};
use crate::db::Role;
use crate::file::SharedFileRepository;
use crate::web::error::WebError;
use crate::web::middleware::Principal;
use crate::web::session::Session;
use crate::web::views;

/// GET / - Role-filtered file listing.
///
/// Administrators see the latest uploads, regular users what they sent and
/// guests what was sent to them.
pub async fn home(
    State(state): State<Arc<AppState>>,
    session: Session,
    principal: Principal,
) -> Result<Response, WebError> {
    let ctx = state.page(&session, &principal).await?;
    let Some(user) = principal.user() else {
        return Ok(render(StatusCode::OK, views::landing_page(&ctx)));
    };

    let repo = SharedFileRepository::new(state.db.pool());
    let (heading, files) = match user.role {
        Role::Admin => (
            "Latest files",
            repo.latest(state.settings.listing_limit).await?,
        ),
        Role::Guest => ("Files shared with you", repo.for_recipient(&user.email).await?),
        Role::User => ("Files you shared", repo.for_sender(&user.email).await?),
        Role::Disabled => return Ok(render(StatusCode::OK, views::landing_page(&ctx))),
    };

    Ok(render(StatusCode::OK, views::home_page(&ctx, heading, &files)))
}

/// GET /ping
pub async fn ping() -> &'static str {
    "OK"
}
