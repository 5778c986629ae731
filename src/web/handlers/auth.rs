//! Signup, login and logout handlers.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Form,
};

use super::{render, AppState};
use crate::auth::{authenticate, register, RegistrationRequest};
use crate::db::UserRepository;
use crate::web::error::WebError;
use crate::web::forms::{
    check, CsrfForm, FormErrors, LoginForm, SignupForm, BAD_CREDENTIALS, EMAIL_IN_USE,
};
use crate::web::middleware::Principal;
use crate::web::session::Session;
use crate::web::views;
use crate::FileshareError;

pub const SIGNED_UP: &str = "Your signup was successful. Please log in.";
pub const LOGGED_OUT: &str = "You've been logged out successfully!";
const ACCOUNT_DISABLED: &str = "This account has been disabled";

/// GET /user/signup
pub async fn signup_form(
    State(state): State<Arc<AppState>>,
    session: Session,
    principal: Principal,
) -> Result<Response, WebError> {
    let ctx = state.form_page(&session, &principal).await?;
    Ok(render(
        StatusCode::OK,
        views::signup_page(&ctx, &SignupForm::default(), &FormErrors::new()),
    ))
}

/// POST /user/signup
pub async fn signup(
    State(state): State<Arc<AppState>>,
    session: Session,
    principal: Principal,
    Form(mut form): Form<SignupForm>,
) -> Result<Response, WebError> {
    session.verify_csrf(&form.csrf_token).await?;
    form.normalize();

    let mut errors = check(&form);
    if errors.is_empty() {
        let repo = UserRepository::new(state.db.pool());
        let request = RegistrationRequest::new(&form.name, &form.email, &form.password);
        match register(&repo, &request).await {
            Ok(_) => {
                session.set_flash(SIGNED_UP).await?;
                return Ok(Redirect::to("/user/login").into_response());
            }
            Err(FileshareError::DuplicateEmail) => errors.add_field("email", EMAIL_IN_USE),
            Err(e) => return Err(e.into()),
        }
    }

    let ctx = state.form_page(&session, &principal).await?;
    Ok(render(
        StatusCode::UNPROCESSABLE_ENTITY,
        views::signup_page(&ctx, &form, &errors),
    ))
}

/// GET /user/login
pub async fn login_form(
    State(state): State<Arc<AppState>>,
    session: Session,
    principal: Principal,
) -> Result<Response, WebError> {
    let ctx = state.form_page(&session, &principal).await?;
    Ok(render(
        StatusCode::OK,
        views::login_page(&ctx, &LoginForm::default(), &FormErrors::new()),
    ))
}

/// POST /user/login
///
/// A successful login moves the session to a new id.
pub async fn login(
    State(state): State<Arc<AppState>>,
    session: Session,
    principal: Principal,
    Form(mut form): Form<LoginForm>,
) -> Result<Response, WebError> {
    session.verify_csrf(&form.csrf_token).await?;
    form.normalize();

    let mut errors = check(&form);
    if errors.is_empty() {
        let repo = UserRepository::new(state.db.pool());
        match authenticate(&repo, &form.email, &form.password).await {
            Ok(user) => {
                session.log_in(user.id).await?;
                tracing::info!("User {} logged in", user.id);
                return Ok(Redirect::to("/").into_response());
            }
            Err(FileshareError::InvalidCredentials) => errors.add_non_field(BAD_CREDENTIALS),
            Err(FileshareError::Permission(_)) => errors.add_non_field(ACCOUNT_DISABLED),
            Err(e) => return Err(e.into()),
        }
    }

    let ctx = state.form_page(&session, &principal).await?;
    Ok(render(
        StatusCode::UNPROCESSABLE_ENTITY,
        views::login_page(&ctx, &form, &errors),
    ))
}

/// POST /user/logout
pub async fn logout(
    session: Session,
    principal: Principal,
    Form(form): Form<CsrfForm>,
) -> Result<Response, WebError> {
    session.verify_csrf(&form.csrf_token).await?;

    if let Some(user) = principal.user() {
        tracing::info!("User {} logged out", user.id);
    }
    session.log_out().await?;
    session.set_flash(LOGGED_OUT).await?;
    Ok(Redirect::to("/").into_response())
}
