//! Router configuration for the web UI.

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{catch_panic::CatchPanicLayer, services::ServeDir, trace::TraceLayer};

use super::handlers::{
    account_form, create_file, create_file_form, delete_file, delete_user, download_file,
    edit_user, edit_user_form, home, list_users, login, login_form, logout, ping, signup,
    signup_form, update_own_account, view_file, AppState,
};
use super::middleware::{require_admin, require_authentication, resolve_principal, security_headers};
use super::session::session_layer;

/// Multipart framing on top of the file itself.
const UPLOAD_OVERHEAD_BYTES: usize = 64 * 1024;

/// Create the main router.
pub fn create_router(app_state: Arc<AppState>) -> Router {
    // No guard; handlers adapt to the principal
    let public_routes = Router::new()
        .route("/", get(home))
        .route("/files/view/:id", get(view_file))
        .route("/user/signup", get(signup_form).post(signup))
        .route("/user/login", get(login_form).post(login))
        .route("/user/logout", post(logout));

    let protected_routes = Router::new()
        .route("/files/create", get(create_file_form).post(create_file))
        .route("/files/download/:file", get(download_file))
        .route("/files/delete/:id", get(delete_file))
        .route("/user/update/", get(account_form).post(update_own_account))
        .route_layer(middleware::from_fn(require_authentication));

    let admin_routes = Router::new()
        .route("/users/", get(list_users))
        .route("/user/edit/:id", get(edit_user_form).post(edit_user))
        .route("/user/delete/:id", post(delete_user))
        .route_layer(middleware::from_fn(require_admin));

    let sessions = session_layer(app_state.db.session_store(), &app_state.settings);

    let body_limit = app_state
        .settings
        .max_upload_bytes
        .saturating_add(UPLOAD_OVERHEAD_BYTES);

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .merge(admin_routes)
        .layer(
            ServiceBuilder::new()
                .layer(sessions)
                .layer(middleware::from_fn_with_state(
                    app_state.clone(),
                    resolve_principal,
                )),
        )
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(app_state)
}

/// Routes that need no session.
pub fn create_health_router() -> Router {
    Router::new().route("/ping", get(ping))
}

/// Serve static assets under `/static`.
pub fn create_static_router(static_path: &str) -> Router {
    Router::new().nest_service("/static", ServeDir::new(static_path))
}

/// Assemble the complete application with the outer layers.
pub fn create_app(app_state: Arc<AppState>, static_path: Option<&str>) -> Router {
    let mut router = create_router(app_state).merge(create_health_router());

    if let Some(path) = static_path {
        router = router.merge(create_static_router(path));
    }

    router.layer(
        ServiceBuilder::new()
            .layer(CatchPanicLayer::new())
            .layer(TraceLayer::new_for_http())
            .layer(middleware::from_fn(security_headers)),
    )
}
