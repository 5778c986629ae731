//! Per-file access rules.

use crate::db::Role;
use crate::file::SharedFile;

/// Administrators, the sender and the recipient may download a file.
pub fn can_download(role: Role, email: &str, file: &SharedFile) -> bool {
    match role {
        Role::Admin => true,
        Role::User | Role::Guest => file.is_sender(email) || file.is_recipient(email),
        Role::Disabled => false,
    }
}

/// Administrators and the sender may delete a file.
pub fn can_delete(role: Role, email: &str, file: &SharedFile) -> bool {
    match role {
        Role::Admin => true,
        Role::User | Role::Guest => file.is_sender(email),
        Role::Disabled => false,
    }
}
