//! Random credentials: one-time passwords and opaque tokens.

use rand::distr::Alphanumeric;
use rand::Rng;

/// Length of generated one-time passwords.
pub const ONE_TIME_PASSWORD_LENGTH: usize = 15;

/// Length of session and CSRF tokens.
pub const TOKEN_LENGTH: usize = 32;

/// Random string drawn from `[A-Za-z0-9]`.
pub fn random_alphanumeric(len: usize) -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

/// Password issued to an auto-provisioned recipient account.
pub fn one_time_password() -> String {
    random_alphanumeric(ONE_TIME_PASSWORD_LENGTH)
}

/// Opaque token for sessions and CSRF protection.
pub fn random_token() -> String {
    random_alphanumeric(TOKEN_LENGTH)
}
