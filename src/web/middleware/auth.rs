//! Principal resolution and route guards.
//!
//! [`resolve_principal`] turns the session's user id into a typed
//! [`Principal`]; the `require_*` middlewares gate route groups on it.

use std::sync::Arc;

use axum::{
    async_trait,
    body::Body,
    extract::{FromRequestParts, State},
    http::{header, request::Parts, HeaderValue, Request},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

use crate::db::{Role, UserRepository};
use crate::web::error::WebError;
use crate::web::handlers::AppState;
use crate::web::session::Session;

/// The signed-in account, as seen by handlers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: Role,
}

/// Who is making the request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Principal {
    #[default]
    Anonymous,
    Authenticated(CurrentUser),
}

impl Principal {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Principal::Authenticated(_))
    }

    pub fn is_admin(&self) -> bool {
        self.role() == Some(Role::Admin)
    }

    /// Regular (non-admin, non-guest) user.
    pub fn is_user(&self) -> bool {
        self.role() == Some(Role::User)
    }

    pub fn is_guest(&self) -> bool {
        self.role() == Some(Role::Guest)
    }

    pub fn role(&self) -> Option<Role> {
        self.user().map(|u| u.role)
    }

    pub fn user(&self) -> Option<&CurrentUser> {
        match self {
            Principal::Anonymous => None,
            Principal::Authenticated(user) => Some(user),
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Principal
where
    S: Send + Sync,
{
    type Rejection = WebError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<Principal>()
            .cloned()
            .unwrap_or_default())
    }
}

/// Resolve the session into a [`Principal`] for downstream handlers.
///
/// A session pointing at a deleted or disabled account is anonymous.
pub async fn resolve_principal(
    State(state): State<Arc<AppState>>,
    session: Session,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let user_id = match session.user_id().await {
        Ok(user_id) => user_id,
        Err(e) => return e.into_response(),
    };

    let principal = match user_id {
        Some(id) => match UserRepository::new(state.db.pool()).get_by_id(id).await {
            Ok(Some(user)) if user.role.is_active() => Principal::Authenticated(CurrentUser {
                id: user.id,
                name: user.name,
                email: user.email,
                role: user.role,
            }),
            Ok(_) => {
                tracing::debug!("Session user {} is gone or disabled", id);
                Principal::Anonymous
            }
            Err(e) => return WebError::from(e).into_response(),
        },
        None => Principal::Anonymous,
    };

    req.extensions_mut().insert(principal);
    next.run(req).await
}

fn no_store(mut response: Response) -> Response {
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response
}

/// Send anonymous requests to the home page.
pub async fn require_authentication(
    principal: Principal,
    req: Request<Body>,
    next: Next,
) -> Response {
    if !principal.is_authenticated() {
        return Redirect::to("/").into_response();
    }
    no_store(next.run(req).await)
}

/// Only administrators pass; anonymous requests go home.
pub async fn require_admin(principal: Principal, req: Request<Body>, next: Next) -> Response {
    if !principal.is_authenticated() {
        return Redirect::to("/").into_response();
    }
    if !principal.is_admin() {
        return WebError::forbidden("administrator role required").into_response();
    }
    no_store(next.run(req).await)
}
