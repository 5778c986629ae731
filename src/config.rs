//! Configuration module for fileshare.

use serde::Deserialize;
use std::path::Path;

use crate::{FileshareError, Result};

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port number to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Public URL of the portal, used for links in notification mails.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Timezone for displaying dates (e.g., "Europe/London", "UTC").
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    4000
}

fn default_base_url() -> String {
    "http://localhost:4000".to_string()
}

fn default_timezone() -> String {
    "UTC".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            base_url: default_base_url(),
            timezone: default_timezone(),
        }
    }
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: String,
}

fn default_db_path() -> String {
    "data/fileshare.db".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// Shared file configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct FilesConfig {
    /// Path to the blob storage directory.
    #[serde(default = "default_storage_path")]
    pub storage_path: String,
    /// Maximum upload size in megabytes.
    #[serde(default = "default_max_upload_size")]
    pub max_upload_size_mb: u64,
    /// Expiry pre-filled on the upload form, in days.
    #[serde(default = "default_expiry_days")]
    pub default_expiry_days: i64,
    /// Number of files on the administrator's home listing.
    #[serde(default = "default_listing_limit")]
    pub listing_limit: i64,
}

fn default_storage_path() -> String {
    "data/uploads".to_string()
}

fn default_max_upload_size() -> u64 {
    25
}

fn default_expiry_days() -> i64 {
    365
}

fn default_listing_limit() -> i64 {
    10
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            storage_path: default_storage_path(),
            max_upload_size_mb: default_max_upload_size(),
            default_expiry_days: default_expiry_days(),
            listing_limit: default_listing_limit(),
        }
    }
}

/// Session cookie configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Name of the session cookie.
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
    /// Session lifetime in hours.
    #[serde(default = "default_lifetime_hours")]
    pub lifetime_hours: i64,
    /// Mark the cookie `Secure` (set when served behind HTTPS).
    #[serde(default)]
    pub secure_cookie: bool,
}

fn default_cookie_name() -> String {
    "fileshare_session".to_string()
}

fn default_lifetime_hours() -> i64 {
    12
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: default_cookie_name(),
            lifetime_hours: default_lifetime_hours(),
            secure_cookie: false,
        }
    }
}

/// Outbound mail settings.
///
/// These only seed the `server_config` table on first run; at request time
/// the mailer reads the table.
#[derive(Debug, Clone, Deserialize)]
pub struct MailConfig {
    /// SMTP relay host. Empty means "do not seed".
    #[serde(default)]
    pub server: String,
    /// SMTP port (implicit TLS).
    #[serde(default = "default_mail_port")]
    pub port: u16,
    /// SMTP username.
    #[serde(default)]
    pub username: String,
    /// SMTP password.
    #[serde(default)]
    pub password: String,
    /// Envelope sender. Falls back to `username` when empty.
    #[serde(default)]
    pub from_address: String,
    /// Attach the uploaded file to the notification.
    #[serde(default = "default_attach_files")]
    pub attach_files: bool,
}

fn default_mail_port() -> u16 {
    465
}

fn default_attach_files() -> bool {
    true
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            server: String::new(),
            port: default_mail_port(),
            username: String::new(),
            password: String::new(),
            from_address: String::new(),
            attach_files: default_attach_files(),
        }
    }
}

/// Initial administrator account created on first run.
#[derive(Debug, Clone, Deserialize)]
pub struct AdminConfig {
    /// Display name of the administrator.
    #[serde(default = "default_admin_name")]
    pub name: String,
    /// Login email of the administrator.
    #[serde(default = "default_admin_email")]
    pub email: String,
    /// Initial password. Prompted on stdin when empty.
    #[serde(default)]
    pub password: String,
}

fn default_admin_name() -> String {
    "Administrator".to_string()
}

fn default_admin_email() -> String {
    "admin@localhost".to_string()
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            name: default_admin_name(),
            email: default_admin_email(),
            password: String::new(),
        }
    }
}

/// Web UI configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct WebConfig {
    /// Serve static assets under `/static`.
    #[serde(default)]
    pub serve_static: bool,
    /// Path to the static asset directory.
    #[serde(default = "default_static_path")]
    pub static_path: String,
}

fn default_static_path() -> String {
    "ui/static".to_string()
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            serve_static: false,
            static_path: default_static_path(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Path to the log file. Empty for console only.
    #[serde(default = "default_log_file")]
    pub file: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> String {
    "logs/fileshare.log".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// HTTP server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Shared file configuration.
    #[serde(default)]
    pub files: FilesConfig,
    /// Session configuration.
    #[serde(default)]
    pub session: SessionConfig,
    /// Mail seed configuration.
    #[serde(default)]
    pub mail: MailConfig,
    /// First-run administrator.
    #[serde(default)]
    pub admin: AdminConfig,
    /// Web UI configuration.
    #[serde(default)]
    pub web: WebConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(FileshareError::Io)?;
        Self::parse(&content)
    }

    /// Load configuration from a TOML file and apply environment variable overrides.
    pub fn load_with_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| FileshareError::Config(format!("parse error: {e}")))
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Supported environment variables:
    /// - `FILESHARE_DATABASE_PATH`
    /// - `FILESHARE_MAIL_PASSWORD`
    /// - `FILESHARE_ADMIN_PASSWORD`
    ///
    /// Empty values are ignored.
    pub fn apply_env_overrides(&mut self) {
        if let Some(path) = non_empty_env("FILESHARE_DATABASE_PATH") {
            self.database.path = path;
        }
        if let Some(password) = non_empty_env("FILESHARE_MAIL_PASSWORD") {
            self.mail.password = password;
        }
        if let Some(password) = non_empty_env("FILESHARE_ADMIN_PASSWORD") {
            self.admin.password = password;
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(FileshareError::Config("server.port must not be 0".into()));
        }
        if self.files.max_upload_size_mb == 0 {
            return Err(FileshareError::Config(
                "files.max_upload_size_mb must be positive".into(),
            ));
        }
        if self.files.default_expiry_days <= 0 {
            return Err(FileshareError::Config(
                "files.default_expiry_days must be positive".into(),
            ));
        }
        if self.files.listing_limit <= 0 {
            return Err(FileshareError::Config(
                "files.listing_limit must be positive".into(),
            ));
        }
        if self.session.lifetime_hours <= 0 {
            return Err(FileshareError::Config(
                "session.lifetime_hours must be positive".into(),
            ));
        }
        Ok(())
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}
