//! User model for fileshare.
//!
//! This module defines the User struct and the Role enum.

use std::fmt;
use std::str::FromStr;

use sqlx::sqlite::SqliteRow;
use sqlx::Row;

/// Account role.
///
/// One role per account. A disabled account keeps its row but cannot sign in
/// and is treated as anonymous by the web layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Role {
    /// Administrator: sees every file and manages users.
    Admin,
    /// Regular user: uploads files and sees what they sent.
    #[default]
    User,
    /// Recipient-only account created by an upload.
    Guest,
    /// Account that may no longer sign in.
    Disabled,
}

impl Role {
    /// All roles, in the order the admin form lists them.
    pub const ALL: [Role; 4] = [Role::Admin, Role::User, Role::Guest, Role::Disabled];

    /// Convert role to database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
            Role::Guest => "guest",
            Role::Disabled => "disabled",
        }
    }

    /// Get display name for the role.
    pub fn display_name(&self) -> &'static str {
        match self {
            Role::Admin => "Administrator",
            Role::User => "User",
            Role::Guest => "Guest",
            Role::Disabled => "Disabled",
        }
    }

    /// Whether an account with this role may sign in.
    pub fn is_active(&self) -> bool {
        *self != Role::Disabled
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "user" => Ok(Role::User),
            "guest" => Ok(Role::Guest),
            "disabled" => Ok(Role::Disabled),
            _ => Err(format!("unknown role: {s}")),
        }
    }
}

/// A registered account.
#[derive(Debug, Clone)]
pub struct User {
    /// Unique user ID.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Login email (unique, case-insensitive).
    pub email: String,
    /// Password hash (Argon2).
    pub password_hash: String,
    /// Account role.
    pub role: Role,
    /// Account creation timestamp.
    pub created_at: String,
}

impl User {
    /// Check if this user is an administrator.
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

impl<'r> sqlx::FromRow<'r, SqliteRow> for User {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let role: String = row.try_get("role")?;
        let role = role.parse::<Role>().map_err(|e| sqlx::Error::ColumnDecode {
            index: "role".to_string(),
            source: e.into(),
        })?;

        Ok(Self {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            email: row.try_get("email")?,
            password_hash: row.try_get("password_hash")?,
            role,
            created_at: row.try_get("created_at")?,
        })
    }
}

/// Data for creating a new user.
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Display name.
    pub name: String,
    /// Login email.
    pub email: String,
    /// Password hash (should be pre-hashed with Argon2).
    pub password_hash: String,
    /// Role (defaults to User).
    pub role: Role,
}

impl NewUser {
    /// Create a new regular user.
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        password_hash: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            password_hash: password_hash.into(),
            role: Role::User,
        }
    }

    /// Set the role.
    pub fn with_role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }
}

/// Data for updating an existing user.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    /// New display name.
    pub name: Option<String>,
    /// New email.
    pub email: Option<String>,
    /// New password hash.
    pub password_hash: Option<String>,
    /// New role.
    pub role: Option<Role>,
}

impl UserUpdate {
    /// Create an empty update.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set new display name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set new email.
    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Set new password hash.
    pub fn password_hash(mut self, hash: impl Into<String>) -> Self {
        self.password_hash = Some(hash.into());
        self
    }

    /// Set new role.
    pub fn role(mut self, role: Role) -> Self {
        self.role = Some(role);
        self
    }

    /// Check if any fields are set.
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.email.is_none()
            && self.password_hash.is_none()
            && self.role.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_as_str_roundtrip() {
        for role in Role::ALL {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
    }

    #[test]
    fn test_role_from_str_case_insensitive() {
        assert_eq!("ADMIN".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!("Guest".parse::<Role>().unwrap(), Role::Guest);
        assert!("sysop".parse::<Role>().is_err());
    }

    #[test]
    fn test_role_is_active() {
        assert!(Role::Admin.is_active());
        assert!(Role::Guest.is_active());
        assert!(!Role::Disabled.is_active());
    }

    #[test]
    fn test_role_default() {
        assert_eq!(Role::default(), Role::User);
    }

    #[test]
    fn test_new_user_builder() {
        let user = NewUser::new("Cheryl", "cheryl@example.com", "hash").with_role(Role::Guest);
        assert_eq!(user.name, "Cheryl");
        assert_eq!(user.email, "cheryl@example.com");
        assert_eq!(user.role, Role::Guest);
    }

    #[test]
    fn test_user_update_builder() {
        let update = UserUpdate::new();
        assert!(update.is_empty());

        let update = UserUpdate::new().name("New").role(Role::Admin);
        assert!(!update.is_empty());
        assert_eq!(update.name.as_deref(), Some("New"));
        assert_eq!(update.role, Some(Role::Admin));
        assert!(update.password_hash.is_none());
    }
}
