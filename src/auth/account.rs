//! Account lifecycle: registration, authentication, updates and
//! recipient provisioning.

use tracing::{info, warn};

use crate::auth::{hash_password, verify_password, PasswordError};
use crate::db::{NewUser, Role, User, UserRepository, UserUpdate};
use crate::{FileshareError, Result};

/// Registration request data.
#[derive(Debug, Clone)]
pub struct RegistrationRequest {
    /// Display name.
    pub name: String,
    /// Login email.
    pub email: String,
    /// Plaintext password (8-128 characters).
    pub password: String,
    /// Role of the new account.
    pub role: Role,
}

impl RegistrationRequest {
    /// Create a request for a regular user.
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            password: password.into(),
            role: Role::User,
        }
    }

    /// Set the role.
    pub fn with_role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }
}

/// Register a new account.
///
/// Fails with `DuplicateEmail` when the email is taken and with `Validation`
/// when the password length is out of bounds.
pub async fn register(repo: &UserRepository<'_>, request: &RegistrationRequest) -> Result<User> {
    let password_hash = hash_password(&request.password)?;
    let new_user = NewUser::new(request.name.trim(), request.email.trim(), password_hash)
        .with_role(request.role);

    let user = repo.create(&new_user).await?;
    info!("Registered {} account {} ({})", user.role, user.id, user.email);
    Ok(user)
}

/// Check an email/password pair.
///
/// An unknown email and a wrong password both yield `InvalidCredentials`.
/// A disabled account with the right password yields `Permission`.
pub async fn authenticate(repo: &UserRepository<'_>, email: &str, password: &str) -> Result<User> {
    let user = repo
        .get_by_email(email.trim())
        .await?
        .ok_or(FileshareError::InvalidCredentials)?;

    match verify_password(password, &user.password_hash) {
        Ok(()) => {}
        Err(PasswordError::InvalidHash) => {
            warn!("Stored password hash for user {} is malformed", user.id);
            return Err(FileshareError::InvalidCredentials);
        }
        Err(_) => return Err(FileshareError::InvalidCredentials),
    }

    if !user.role.is_active() {
        return Err(FileshareError::Permission("account disabled".to_string()));
    }

    Ok(user)
}

/// Changes applied by an account edit.
#[derive(Debug, Clone, Default)]
pub struct AccountUpdate {
    /// New display name.
    pub name: Option<String>,
    /// New email.
    pub email: Option<String>,
    /// New plaintext password. `None` or blank keeps the current hash.
    pub password: Option<String>,
    /// New role (admin edits only).
    pub role: Option<Role>,
}

/// Apply an account edit.
///
/// Fails with `NotFound` for an unknown id and `DuplicateEmail` when the new
/// email belongs to another account.
pub async fn update_account(
    repo: &UserRepository<'_>,
    id: i64,
    changes: &AccountUpdate,
) -> Result<User> {
    let mut update = UserUpdate::new();
    if let Some(ref name) = changes.name {
        update = update.name(name.trim());
    }
    if let Some(ref email) = changes.email {
        update = update.email(email.trim());
    }
    if let Some(password) = changes.password.as_deref().filter(|p| !p.is_empty()) {
        update = update.password_hash(hash_password(password)?);
    }
    if let Some(role) = changes.role {
        update = update.role(role);
    }

    repo.update(id, &update)
        .await?
        .ok_or_else(|| FileshareError::NotFound("user".to_string()))
}

/// Outcome of provisioning a recipient account.
#[derive(Debug, Clone)]
pub enum Provisioned {
    /// A guest account was created with the supplied password.
    Created(User),
    /// The email already had an account; nothing changed.
    Existing,
}

/// Create a guest account for a file recipient unless one exists.
pub async fn provision_guest(
    repo: &UserRepository<'_>,
    name: &str,
    email: &str,
    password: &str,
) -> Result<Provisioned> {
    let request = RegistrationRequest::new(name, email, password).with_role(Role::Guest);
    match register(repo, &request).await {
        Ok(user) => Ok(Provisioned::Created(user)),
        Err(FileshareError::DuplicateEmail) => Ok(Provisioned::Existing),
        Err(e) => Err(e),
    }
}

/// Create the first administrator if no administrator exists yet.
///
/// Returns the new account, or `None` when an administrator already exists.
pub async fn ensure_admin(
    repo: &UserRepository<'_>,
    name: &str,
    email: &str,
    password: &str,
) -> Result<Option<User>> {
    if repo.count_by_role(Role::Admin).await? > 0 {
        return Ok(None);
    }

    let request = RegistrationRequest::new(name, email, password).with_role(Role::Admin);
    register(repo, &request).await.map(Some)
}
