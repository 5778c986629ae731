//! File handlers: view, upload, download and delete.

use std::sync::Arc;

use axum::{
    extract::{multipart::MultipartError, Multipart, Path, Query, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;

use super::{parse_id, render, AppState};
use crate::auth::{can_delete, can_download, hash_password, one_time_password, provision_guest, Provisioned};
use crate::db::UserRepository;
use crate::file::{NewSharedFile, SharedFileRepository};
use crate::mail::{Attachment, Notification};
use crate::web::error::WebError;
use crate::web::forms::{FileCreateForm, FormErrors};
use crate::web::middleware::Principal;
use crate::web::session::Session;
use crate::web::views;
use crate::FileshareError;

/// Flash shown after a successful upload.
pub const UPLOADED: &str = "File successfully uploaded!";
/// Flash shown when the recipient already had an account.
pub const RECIPIENT_EXISTS: &str = "Email address is already in use, no new account created";
/// Flash shown after a deletion.
pub const DELETED: &str = "File successfully deleted!";

/// Build a Content-Disposition header value with proper encoding for non-ASCII filenames.
///
/// Uses RFC 5987 encoding for filenames with non-ASCII characters.
fn content_disposition_header(filename: &str) -> String {
    let sanitized: String = filename
        .chars()
        .filter(|c| !c.is_control())
        .map(|c| match c {
            '"' | '\\' => '_',
            c if !c.is_ascii() => '_',
            _ => c,
        })
        .collect();

    if filename.is_ascii() && !filename.chars().any(|c| c.is_control() || c == '"' || c == '\\') {
        return format!("attachment; filename=\"{}\"", filename);
    }

    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        sanitized,
        urlencoding::encode(filename)
    )
}

fn content_type_for(filename: &str) -> String {
    mime_guess::from_path(filename)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

fn multipart_error(e: MultipartError) -> WebError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        WebError::payload_too_large(e.body_text())
    } else {
        WebError::bad_request(format!("invalid multipart data: {}", e.body_text()))
    }
}

/// GET /files/view/:id
pub async fn view_file(
    State(state): State<Arc<AppState>>,
    session: Session,
    principal: Principal,
    Path(raw_id): Path<String>,
) -> Result<Response, WebError> {
    let id = parse_id(&raw_id)?;
    let file = SharedFileRepository::new(state.db.pool()).get(id).await?;

    let (download, delete) = match principal.user() {
        Some(user) => (
            can_download(user.role, &user.email, &file),
            can_delete(user.role, &user.email, &file),
        ),
        None => (false, false),
    };

    let ctx = state.page(&session, &principal).await?;
    Ok(render(
        StatusCode::OK,
        views::file_view_page(&ctx, &file, download, delete),
    ))
}

/// GET /files/create
pub async fn create_file_form(
    State(state): State<Arc<AppState>>,
    session: Session,
    principal: Principal,
) -> Result<Response, WebError> {
    let mut form = FileCreateForm {
        expires: state.settings.default_expiry_days.to_string(),
        ..Default::default()
    };
    if let Some(user) = principal.user() {
        form.sender_name = user.name.clone();
        form.sender_email = user.email.clone();
    }

    let ctx = state.form_page(&session, &principal).await?;
    Ok(render(
        StatusCode::OK,
        views::file_create_page(&ctx, &form, &FormErrors::new()),
    ))
}

/// POST /files/create - Store an upload and notify the recipient.
///
/// The recipient gets a guest account with a one-time password unless the
/// email is already registered, in which case no password is mailed.
/// Non-admin uploads always carry the uploader's own email as sender.
pub async fn create_file(
    State(state): State<Arc<AppState>>,
    session: Session,
    principal: Principal,
    mut multipart: Multipart,
) -> Result<Response, WebError> {
    let mut form = FileCreateForm::default();
    let mut upload: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or("").to_string();
        if name == "uploadFile" {
            let filename = field.file_name().unwrap_or("").to_string();
            let content = field.bytes().await.map_err(multipart_error)?;
            if !content.is_empty() {
                upload = Some((filename, content.to_vec()));
            }
        } else {
            let value = field.text().await.map_err(multipart_error)?;
            form.set(&name, value);
        }
    }

    session.verify_csrf(&form.csrf_token).await?;

    // Only admins may send on behalf of another address.
    if let Some(user) = principal.user().filter(|_| !principal.is_admin()) {
        form.sender_email = user.email.clone();
    }

    let Some((filename, content)) = upload else {
        let mut errors = FormErrors::new();
        errors.add_field("uploadFile", "Please choose a file to upload");
        let ctx = state.form_page(&session, &principal).await?;
        return Ok(render(
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            views::file_create_page(&ctx, &form, &errors),
        ));
    };

    if form.doc_name.is_empty() {
        form.doc_name = if filename.trim().is_empty() {
            "upload".to_string()
        } else {
            filename.trim().to_string()
        };
    }

    let (errors, expires) = form.check();
    let expires_in_days = match expires {
        Some(days) if errors.is_empty() => days,
        _ => {
            let ctx = state.form_page(&session, &principal).await?;
            return Ok(render(
                StatusCode::UNPROCESSABLE_ENTITY,
                views::file_create_page(&ctx, &form, &errors),
            ));
        }
    };

    let password = one_time_password();
    let password_hash = hash_password(&password).map_err(FileshareError::from)?;

    let stored_name = state.storage.save(&content, &form.doc_name).await?;
    let new_file = NewSharedFile {
        doc_name: form.doc_name.clone(),
        stored_name: stored_name.clone(),
        size: content.len() as i64,
        sender_name: form.sender_name.clone(),
        sender_email: form.sender_email.clone(),
        recipient_name: form.recipient_name.clone(),
        recipient_email: form.recipient_email.clone(),
        password_hash,
        expires_in_days,
    };

    let file_id = match SharedFileRepository::new(state.db.pool())
        .insert(&new_file)
        .await
    {
        Ok(id) => id,
        Err(e) => {
            if let Err(cleanup) = state.storage.delete(&stored_name).await {
                tracing::warn!("Failed to remove orphaned blob {}: {}", stored_name, cleanup);
            }
            return Err(e.into());
        }
    };
    tracing::info!(
        "Stored file {} ({} bytes) from {} for {}",
        file_id,
        content.len(),
        form.sender_email,
        form.recipient_email
    );

    let users = UserRepository::new(state.db.pool());
    let provisioned = provision_guest(
        &users,
        &form.recipient_name,
        &form.recipient_email,
        &password,
    )
    .await?;
    let one_time_password = match provisioned {
        Provisioned::Created(_) => Some(password),
        Provisioned::Existing => None,
    };
    let recipient_existed = one_time_password.is_none();

    let notification = Notification {
        file_id,
        doc_name: form.doc_name.clone(),
        sender_name: form.sender_name.clone(),
        sender_email: form.sender_email.clone(),
        recipient_name: form.recipient_name.clone(),
        recipient_email: form.recipient_email.clone(),
        one_time_password,
        portal_url: state.settings.base_url.clone(),
        attachment: Some(Attachment {
            filename: form.doc_name.clone(),
            content_type: content_type_for(&form.doc_name),
            content,
        }),
    };

    if let Err(e) = state.mailer.send(&notification).await {
        tracing::error!(
            "Failed to notify {} about file {}: {}",
            notification.recipient_email,
            file_id,
            e
        );
        return Err(WebError::internal("notification failed"));
    }

    session
        .set_flash(if recipient_existed {
            RECIPIENT_EXISTS
        } else {
            UPLOADED
        })
        .await?;
    Ok(Redirect::to(&format!("/files/view/{file_id}")).into_response())
}

/// GET /files/download/:file - Stream a file by its stored name.
pub async fn download_file(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    Path(stored_name): Path<String>,
) -> Result<Response, WebError> {
    let file = SharedFileRepository::new(state.db.pool())
        .get_by_stored_name(&stored_name)
        .await?;

    let allowed = principal
        .user()
        .is_some_and(|user| can_download(user.role, &user.email, &file));
    if !allowed {
        return Err(WebError::forbidden(format!(
            "download of file {} denied",
            file.id
        )));
    }

    let content = state.storage.load(&file.stored_name).await?;

    let disposition = HeaderValue::from_str(&content_disposition_header(&file.doc_name))
        .map_err(|e| WebError::internal(e.to_string()))?;
    let content_type = HeaderValue::from_str(&content_type_for(&file.doc_name))
        .map_err(|e| WebError::internal(e.to_string()))?;

    Ok((
        [
            (header::CONTENT_TYPE, content_type),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        content,
    )
        .into_response())
}

/// Query of the delete link.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DeleteQuery {
    pub csrf_token: String,
}

/// GET /files/delete/:id
///
/// Expired files can still be deleted. Removing the bytes is best effort.
pub async fn delete_file(
    State(state): State<Arc<AppState>>,
    session: Session,
    principal: Principal,
    Path(raw_id): Path<String>,
    Query(query): Query<DeleteQuery>,
) -> Result<Response, WebError> {
    let id = parse_id(&raw_id)?;
    session.verify_csrf(&query.csrf_token).await?;

    let repo = SharedFileRepository::new(state.db.pool());
    let file = repo.get_any(id).await?;

    let allowed = principal
        .user()
        .is_some_and(|user| can_delete(user.role, &user.email, &file));
    if !allowed {
        return Err(WebError::forbidden(format!("delete of file {id} denied")));
    }

    if repo.remove(id).await? {
        if let Err(e) = state.storage.delete(&file.stored_name).await {
            tracing::warn!("Failed to remove blob {}: {}", file.stored_name, e);
        }
        tracing::info!("Deleted file {}", id);
    }

    session.set_flash(DELETED).await?;
    Ok(Redirect::to("/").into_response())
}
