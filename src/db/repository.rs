//! User repository for fileshare.
//!
//! This module provides CRUD operations for users in the database.

use sqlx::QueryBuilder;

use super::user::{NewUser, Role, User, UserUpdate};
use super::DbPool;
use crate::{FileshareError, Result};

const USER_COLUMNS: &str = "id, name, email, password_hash, role, created_at";

/// Map a write error, turning the unique email constraint into
/// [`FileshareError::DuplicateEmail`].
fn map_write_error(e: sqlx::Error) -> FileshareError {
    match &e {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            FileshareError::DuplicateEmail
        }
        _ => FileshareError::Database(e.to_string()),
    }
}

/// Repository for user CRUD operations.
pub struct UserRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new UserRepository with the given database pool reference.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Create a new user in the database.
    ///
    /// Fails with `DuplicateEmail` if the email (case-insensitive) is taken;
    /// the existing row is left untouched.
    pub async fn create(&self, new_user: &NewUser) -> Result<User> {
        let result = sqlx::query(
            "INSERT INTO users (name, email, password_hash, role, created_at)
             VALUES (?, ?, ?, ?, datetime('now'))",
        )
        .bind(&new_user.name)
        .bind(&new_user.email)
        .bind(&new_user.password_hash)
        .bind(new_user.role.as_str())
        .execute(self.pool)
        .await
        .map_err(map_write_error)?;

        let id = result.last_insert_rowid();
        self.get_by_id(id)
            .await?
            .ok_or_else(|| FileshareError::NotFound("user".to_string()))
    }

    /// Get a user by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?");
        let result = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await
            .map_err(|e| FileshareError::Database(e.to_string()))?;

        Ok(result)
    }

    /// Get a user by email (case-insensitive).
    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = ? COLLATE NOCASE");
        let result = sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(self.pool)
            .await
            .map_err(|e| FileshareError::Database(e.to_string()))?;

        Ok(result)
    }

    /// Resolve the role of a user.
    ///
    /// Fails with `NotFound` if the user does not exist.
    pub async fn role_of(&self, id: i64) -> Result<Role> {
        let role: Option<String> = sqlx::query_scalar("SELECT role FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool)
            .await
            .map_err(|e| FileshareError::Database(e.to_string()))?;

        let role = role.ok_or_else(|| FileshareError::NotFound("user".to_string()))?;
        role.parse::<Role>().map_err(FileshareError::Database)
    }

    /// Update a user by ID.
    ///
    /// Only fields that are set in the update are modified.
    /// Returns the updated user, or None if not found.
    pub async fn update(&self, id: i64, update: &UserUpdate) -> Result<Option<User>> {
        if update.is_empty() {
            return self.get_by_id(id).await;
        }

        let mut query: QueryBuilder<sqlx::Sqlite> = QueryBuilder::new("UPDATE users SET ");
        let mut separated = query.separated(", ");

        if let Some(ref name) = update.name {
            separated.push("name = ");
            separated.push_bind_unseparated(name);
        }
        if let Some(ref email) = update.email {
            separated.push("email = ");
            separated.push_bind_unseparated(email);
        }
        if let Some(ref hash) = update.password_hash {
            separated.push("password_hash = ");
            separated.push_bind_unseparated(hash);
        }
        if let Some(role) = update.role {
            separated.push("role = ");
            separated.push_bind_unseparated(role.as_str());
        }

        query.push(" WHERE id = ");
        query.push_bind(id);

        let result = query
            .build()
            .execute(self.pool)
            .await
            .map_err(map_write_error)?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        self.get_by_id(id).await
    }

    /// Delete a user by ID.
    ///
    /// Returns true if a user was deleted, false if not found.
    pub async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| FileshareError::Database(e.to_string()))?;
        Ok(result.rows_affected() > 0)
    }

    /// List all users in creation order.
    pub async fn list_all(&self) -> Result<Vec<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY id");
        let users = sqlx::query_as::<_, User>(&sql)
            .fetch_all(self.pool)
            .await
            .map_err(|e| FileshareError::Database(e.to_string()))?;

        Ok(users)
    }

    /// Count users holding a role.
    pub async fn count_by_role(&self, role: Role) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE role = ?")
            .bind(role.as_str())
            .fetch_one(self.pool)
            .await
            .map_err(|e| FileshareError::Database(e.to_string()))?;
        Ok(count)
    }
}
