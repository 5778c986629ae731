//! Authentication module for fileshare.
//!
//! Password hashing, random credentials, account lifecycle and per-file
//! access rules.

mod account;
mod password;
pub mod permission;
mod token;

pub use account::{
    authenticate, ensure_admin, provision_guest, register, update_account, AccountUpdate,
    Provisioned, RegistrationRequest,
};
pub use password::{
    hash_password, validate_password, verify_password, PasswordError, MAX_PASSWORD_LENGTH,
    MIN_PASSWORD_LENGTH,
};
pub use permission::{can_delete, can_download};
pub use token::{one_time_password, random_token, ONE_TIME_PASSWORD_LENGTH};
