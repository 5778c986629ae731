//! Shared files: metadata with expiry and the on-disk blob store.

mod metadata;
mod storage;

pub use metadata::{NewSharedFile, SharedFile, SharedFileRepository};
pub use storage::FileStorage;

/// Longest accepted expiry, in days.
pub const MAX_EXPIRY_DAYS: i64 = 3650;

/// Maximum length for a displayed document name (in characters).
pub const MAX_DOC_NAME_LENGTH: usize = 255;
