//! User administration and self-service account handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Form,
};

use super::{parse_id, render, AppState};
use crate::auth::{update_account, AccountUpdate};
use crate::db::{User, UserRepository};
use crate::web::error::WebError;
use crate::web::forms::{check, AccountForm, CsrfForm, FormErrors, UserEditForm, EMAIL_IN_USE};
use crate::web::middleware::Principal;
use crate::web::session::Session;
use crate::web::views;
use crate::FileshareError;

pub const UPDATED: &str = "Information Updated";
pub const USER_DELETED: &str = "User Deleted";

async fn find_user(state: &AppState, id: i64) -> Result<User, WebError> {
    UserRepository::new(state.db.pool())
        .get_by_id(id)
        .await?
        .ok_or_else(|| WebError::not_found(format!("user {id}")))
}

/// Apply an edit, turning a taken email into a field error.
async fn apply_update(
    state: &AppState,
    id: i64,
    changes: &AccountUpdate,
    errors: &mut FormErrors,
) -> Result<(), WebError> {
    match update_account(&UserRepository::new(state.db.pool()), id, changes).await {
        Ok(user) => {
            tracing::info!("Updated account {} ({})", user.id, user.email);
            Ok(())
        }
        Err(FileshareError::DuplicateEmail) => {
            errors.add_field("email", EMAIL_IN_USE);
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

/// GET /users/
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    session: Session,
    principal: Principal,
) -> Result<Response, WebError> {
    let users = UserRepository::new(state.db.pool()).list_all().await?;
    let ctx = state.page(&session, &principal).await?;
    Ok(render(StatusCode::OK, views::users_page(&ctx, &users)))
}

/// GET /user/edit/:id
pub async fn edit_user_form(
    State(state): State<Arc<AppState>>,
    session: Session,
    principal: Principal,
    Path(raw_id): Path<String>,
) -> Result<Response, WebError> {
    let id = parse_id(&raw_id)?;
    let user = find_user(&state, id).await?;

    let form = UserEditForm {
        name: user.name,
        email: user.email,
        role: user.role.as_str().to_string(),
        ..Default::default()
    };
    let ctx = state.form_page(&session, &principal).await?;
    Ok(render(
        StatusCode::OK,
        views::user_edit_page(&ctx, id, &form, &FormErrors::new()),
    ))
}

/// POST /user/edit/:id - Administrator edit. A blank password keeps the current one.
pub async fn edit_user(
    State(state): State<Arc<AppState>>,
    session: Session,
    principal: Principal,
    Path(raw_id): Path<String>,
    Form(mut form): Form<UserEditForm>,
) -> Result<Response, WebError> {
    let id = parse_id(&raw_id)?;
    session.verify_csrf(&form.csrf_token).await?;
    find_user(&state, id).await?;
    form.normalize();

    let (mut errors, role) = form.check();
    if errors.is_empty() {
        let changes = AccountUpdate {
            name: Some(form.name.clone()),
            email: Some(form.email.clone()),
            password: form.password.clone(),
            role,
        };
        apply_update(&state, id, &changes, &mut errors).await?;
    }

    if errors.is_empty() {
        session.set_flash(UPDATED).await?;
        return Ok(Redirect::to(&format!("/user/edit/{id}")).into_response());
    }

    let ctx = state.form_page(&session, &principal).await?;
    Ok(render(
        StatusCode::UNPROCESSABLE_ENTITY,
        views::user_edit_page(&ctx, id, &form, &errors),
    ))
}

/// POST /user/delete/:id
///
/// Administrators cannot delete their own account.
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    session: Session,
    principal: Principal,
    Path(raw_id): Path<String>,
    Form(form): Form<CsrfForm>,
) -> Result<Response, WebError> {
    let id = parse_id(&raw_id)?;
    session.verify_csrf(&form.csrf_token).await?;

    if principal.user().is_some_and(|me| me.id == id) {
        return Err(WebError::forbidden("administrators cannot delete themselves"));
    }

    if !UserRepository::new(state.db.pool()).delete(id).await? {
        return Err(WebError::not_found(format!("user {id}")));
    }
    tracing::info!("Deleted user {}", id);

    session.set_flash(USER_DELETED).await?;
    Ok(Redirect::to("/users/").into_response())
}

/// GET /user/update/
pub async fn account_form(
    State(state): State<Arc<AppState>>,
    session: Session,
    principal: Principal,
) -> Result<Response, WebError> {
    let me = principal
        .user()
        .ok_or_else(|| WebError::forbidden("not signed in"))?;

    let form = AccountForm {
        name: me.name.clone(),
        email: me.email.clone(),
        ..Default::default()
    };
    let ctx = state.form_page(&session, &principal).await?;
    Ok(render(
        StatusCode::OK,
        views::account_page(&ctx, &form, &FormErrors::new()),
    ))
}

/// POST /user/update/ - Change the signed-in account's name, email or password.
pub async fn update_own_account(
    State(state): State<Arc<AppState>>,
    session: Session,
    principal: Principal,
    Form(mut form): Form<AccountForm>,
) -> Result<Response, WebError> {
    session.verify_csrf(&form.csrf_token).await?;
    let me = principal
        .user()
        .ok_or_else(|| WebError::forbidden("not signed in"))?;
    form.normalize();

    let mut errors = check(&form);
    if errors.is_empty() {
        let changes = AccountUpdate {
            name: Some(form.name.clone()),
            email: Some(form.email.clone()),
            password: form.password.clone(),
            role: None,
        };
        apply_update(&state, me.id, &changes, &mut errors).await?;
    }

    if errors.is_empty() {
        session.set_flash(UPDATED).await?;
        return Ok(Redirect::to("/user/update/").into_response());
    }

    let ctx = state.form_page(&session, &principal).await?;
    Ok(render(
        StatusCode::UNPROCESSABLE_ENTITY,
        views::account_page(&ctx, &form, &errors),
    ))
}
