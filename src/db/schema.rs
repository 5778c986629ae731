//! Database schema and migrations for fileshare.
//!
//! Migrations are applied sequentially when the database is first opened or
//! upgraded. Timestamps are UTC text (`YYYY-MM-DD HH:MM:SS`).

/// Database migrations.
///
/// Each migration is a SQL script executed in order. The schema_version
/// table tracks which migrations have been applied.
pub const MIGRATIONS: &[&str] = &[
    // v1: users
    r#"
CREATE TABLE users (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    name            TEXT NOT NULL,
    email           TEXT NOT NULL UNIQUE COLLATE NOCASE,
    password_hash   TEXT NOT NULL,           -- Argon2 PHC string
    role            TEXT NOT NULL DEFAULT 'user',  -- 'admin', 'user', 'guest', 'disabled'
    created_at      TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX idx_users_role ON users(role);
"#,
    // v2: shared file metadata
    r#"
CREATE TABLE shared_files (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    doc_name        TEXT NOT NULL,
    stored_name     TEXT NOT NULL UNIQUE,
    size            INTEGER NOT NULL DEFAULT 0,
    sender_name     TEXT NOT NULL,
    sender_email    TEXT NOT NULL,
    recipient_name  TEXT NOT NULL,
    recipient_email TEXT NOT NULL,
    password_hash   TEXT NOT NULL,           -- hash of the one-time password issued
    created_at      TEXT NOT NULL,
    expires_at      TEXT NOT NULL
);

CREATE INDEX idx_shared_files_expires_at ON shared_files(expires_at);
CREATE INDEX idx_shared_files_recipient ON shared_files(recipient_email COLLATE NOCASE);
CREATE INDEX idx_shared_files_sender ON shared_files(sender_email COLLATE NOCASE);
"#,
    // v3: outbound mail settings (singleton row)
    r#"
CREATE TABLE server_config (
    id              INTEGER PRIMARY KEY CHECK (id = 1),
    mail_server     TEXT NOT NULL,
    mail_port       INTEGER NOT NULL,
    mail_username   TEXT NOT NULL,
    mail_password   TEXT NOT NULL,
    from_address    TEXT NOT NULL,
    attach_files    INTEGER NOT NULL DEFAULT 1
);
"#,
];
