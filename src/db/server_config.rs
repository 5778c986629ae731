//! Outbound mail settings stored as a singleton row.

use super::DbPool;
use crate::{FileshareError, Result};

/// Mail server connection parameters.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct ServerConfig {
    /// SMTP relay host.
    pub mail_server: String,
    /// SMTP port (implicit TLS).
    pub mail_port: i64,
    /// SMTP username.
    pub mail_username: String,
    /// SMTP password.
    pub mail_password: String,
    /// Address used in the `From` header.
    pub from_address: String,
    /// Attach uploaded files to notifications.
    pub attach_files: bool,
}

/// Repository for the `server_config` row.
pub struct ServerConfigRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> ServerConfigRepository<'a> {
    /// Create a new repository instance.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Read the mail settings.
    ///
    /// Fails with `NotFound` until first-run setup has written the row.
    pub async fn get(&self) -> Result<ServerConfig> {
        sqlx::query_as::<_, ServerConfig>(
            "SELECT mail_server, mail_port, mail_username, mail_password, from_address, attach_files
             FROM server_config WHERE id = 1",
        )
        .fetch_optional(self.pool)
        .await
        .map_err(|e| FileshareError::Database(e.to_string()))?
        .ok_or_else(|| FileshareError::NotFound("server config".to_string()))
    }

    /// Whether the row has been written.
    pub async fn exists(&self) -> Result<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM server_config WHERE id = 1)")
                .fetch_one(self.pool)
                .await
                .map_err(|e| FileshareError::Database(e.to_string()))?;
        Ok(exists)
    }

    /// Insert or replace the mail settings.
    pub async fn set(&self, config: &ServerConfig) -> Result<()> {
        sqlx::query(
            "INSERT INTO server_config
                (id, mail_server, mail_port, mail_username, mail_password, from_address, attach_files)
             VALUES (1, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                mail_server = excluded.mail_server,
                mail_port = excluded.mail_port,
                mail_username = excluded.mail_username,
                mail_password = excluded.mail_password,
                from_address = excluded.from_address,
                attach_files = excluded.attach_files",
        )
        .bind(&config.mail_server)
        .bind(config.mail_port)
        .bind(&config.mail_username)
        .bind(&config.mail_password)
        .bind(&config.from_address)
        .bind(config.attach_files)
        .execute(self.pool)
        .await
        .map_err(|e| FileshareError::Database(e.to_string()))?;
        Ok(())
    }
}
