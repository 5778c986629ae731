//! fileshare - share files with auto-provisioned recipients
//!
//! A sender uploads a file for a recipient. The recipient gets a guest
//! account with a one-time password and is notified by email. Administrators
//! see every file and manage accounts.

pub mod auth;
pub mod config;
pub mod datetime;
pub mod db;
pub mod error;
pub mod file;
pub mod html;
pub mod logging;
pub mod mail;
pub mod web;

pub use auth::{
    authenticate, can_delete, can_download, ensure_admin, hash_password, one_time_password,
    provision_guest, register, update_account, validate_password, verify_password,
    AccountUpdate, PasswordError, Provisioned, RegistrationRequest,
};
pub use config::Config;
pub use db::{Database, NewUser, Role, User, UserRepository, UserUpdate};
pub use error::{FileshareError, Result};
pub use file::{FileStorage, NewSharedFile, SharedFile, SharedFileRepository};
pub use mail::{Mailer, MemoryMailer, Notification, SmtpMailer};
pub use web::{AppState, WebServer, WebSettings};
