//! Shared file metadata and its repository.
//!
//! A file is visible only while `now < expires_at`; every lookup except
//! [`SharedFileRepository::get_any`] carries that predicate.

use chrono::{DateTime, Duration, Utc};

use crate::datetime::to_db;
use crate::db::DbPool;
use crate::{FileshareError, Result};

const FILE_COLUMNS: &str = "id, doc_name, stored_name, size, sender_name, sender_email, \
     recipient_name, recipient_email, password_hash, created_at, expires_at";

/// Metadata of an uploaded file.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SharedFile {
    /// Unique file ID.
    pub id: i64,
    /// Original filename shown to users.
    pub doc_name: String,
    /// Name of the blob in storage.
    pub stored_name: String,
    /// Size in bytes.
    pub size: i64,
    /// Name of the sender.
    pub sender_name: String,
    /// Email of the sender.
    pub sender_email: String,
    /// Name of the recipient.
    pub recipient_name: String,
    /// Email of the recipient.
    pub recipient_email: String,
    /// Hash of the one-time password issued with this upload.
    pub password_hash: String,
    /// Upload timestamp.
    pub created_at: String,
    /// Expiry timestamp.
    pub expires_at: String,
}

impl SharedFile {
    /// Whether `email` sent this file.
    pub fn is_sender(&self, email: &str) -> bool {
        self.sender_email.eq_ignore_ascii_case(email)
    }

    /// Whether `email` received this file.
    pub fn is_recipient(&self, email: &str) -> bool {
        self.recipient_email.eq_ignore_ascii_case(email)
    }
}

/// Data for recording an upload.
#[derive(Debug, Clone)]
pub struct NewSharedFile {
    /// Original filename.
    pub doc_name: String,
    /// Name of the blob in storage.
    pub stored_name: String,
    /// Size in bytes.
    pub size: i64,
    /// Name of the sender.
    pub sender_name: String,
    /// Email of the sender.
    pub sender_email: String,
    /// Name of the recipient.
    pub recipient_name: String,
    /// Email of the recipient.
    pub recipient_email: String,
    /// Hash of the one-time password.
    pub password_hash: String,
    /// Lifetime in days.
    pub expires_in_days: i64,
}

/// Repository for shared file metadata.
pub struct SharedFileRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> SharedFileRepository<'a> {
    /// Create a new repository instance.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Record an upload made now. Returns the new id.
    pub async fn insert(&self, file: &NewSharedFile) -> Result<i64> {
        self.insert_at(file, Utc::now()).await
    }

    /// Record an upload made at `now`; it expires `expires_in_days` later.
    pub async fn insert_at(&self, file: &NewSharedFile, now: DateTime<Utc>) -> Result<i64> {
        let expires_at = now + Duration::days(file.expires_in_days);

        let result = sqlx::query(
            "INSERT INTO shared_files
                (doc_name, stored_name, size, sender_name, sender_email,
                 recipient_name, recipient_email, password_hash, created_at, expires_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&file.doc_name)
        .bind(&file.stored_name)
        .bind(file.size)
        .bind(&file.sender_name)
        .bind(&file.sender_email)
        .bind(&file.recipient_name)
        .bind(&file.recipient_email)
        .bind(&file.password_hash)
        .bind(to_db(&now))
        .bind(to_db(&expires_at))
        .execute(self.pool)
        .await
        .map_err(|e| FileshareError::Database(e.to_string()))?;

        Ok(result.last_insert_rowid())
    }

    /// Get a file that has not expired.
    pub async fn get(&self, id: i64) -> Result<SharedFile> {
        self.get_at(id, Utc::now()).await
    }

    /// Get a file that has not expired at `now`.
    ///
    /// Absent and expired rows both fail with `NotFound`.
    pub async fn get_at(&self, id: i64, now: DateTime<Utc>) -> Result<SharedFile> {
        let sql = format!("SELECT {FILE_COLUMNS} FROM shared_files WHERE id = ? AND expires_at > ?");
        sqlx::query_as::<_, SharedFile>(&sql)
            .bind(id)
            .bind(to_db(&now))
            .fetch_optional(self.pool)
            .await
            .map_err(|e| FileshareError::Database(e.to_string()))?
            .ok_or_else(|| FileshareError::NotFound("file".to_string()))
    }

    /// Get a non-expired file by its blob name.
    pub async fn get_by_stored_name(&self, stored_name: &str) -> Result<SharedFile> {
        let sql = format!(
            "SELECT {FILE_COLUMNS} FROM shared_files WHERE stored_name = ? AND expires_at > ?"
        );
        sqlx::query_as::<_, SharedFile>(&sql)
            .bind(stored_name)
            .bind(to_db(&Utc::now()))
            .fetch_optional(self.pool)
            .await
            .map_err(|e| FileshareError::Database(e.to_string()))?
            .ok_or_else(|| FileshareError::NotFound("file".to_string()))
    }

    /// Get a file regardless of expiry.
    pub async fn get_any(&self, id: i64) -> Result<SharedFile> {
        let sql = format!("SELECT {FILE_COLUMNS} FROM shared_files WHERE id = ?");
        sqlx::query_as::<_, SharedFile>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await
            .map_err(|e| FileshareError::Database(e.to_string()))?
            .ok_or_else(|| FileshareError::NotFound("file".to_string()))
    }

    /// The `limit` most recent non-expired files.
    pub async fn latest(&self, limit: i64) -> Result<Vec<SharedFile>> {
        self.latest_at(limit, Utc::now()).await
    }

    /// The `limit` most recent files not expired at `now`.
    pub async fn latest_at(&self, limit: i64, now: DateTime<Utc>) -> Result<Vec<SharedFile>> {
        let sql = format!(
            "SELECT {FILE_COLUMNS} FROM shared_files
             WHERE expires_at > ? ORDER BY id DESC LIMIT ?"
        );
        sqlx::query_as::<_, SharedFile>(&sql)
            .bind(to_db(&now))
            .bind(limit)
            .fetch_all(self.pool)
            .await
            .map_err(|e| FileshareError::Database(e.to_string()))
    }

    /// Non-expired files addressed to `email`, newest first.
    pub async fn for_recipient(&self, email: &str) -> Result<Vec<SharedFile>> {
        self.for_recipient_at(email, Utc::now()).await
    }

    /// Files addressed to `email` that have not expired at `now`.
    pub async fn for_recipient_at(&self, email: &str, now: DateTime<Utc>) -> Result<Vec<SharedFile>> {
        let sql = format!(
            "SELECT {FILE_COLUMNS} FROM shared_files
             WHERE recipient_email = ? COLLATE NOCASE AND expires_at > ?
             ORDER BY id DESC"
        );
        sqlx::query_as::<_, SharedFile>(&sql)
            .bind(email)
            .bind(to_db(&now))
            .fetch_all(self.pool)
            .await
            .map_err(|e| FileshareError::Database(e.to_string()))
    }

    /// Non-expired files sent by `email`, newest first.
    pub async fn for_sender(&self, email: &str) -> Result<Vec<SharedFile>> {
        self.for_sender_at(email, Utc::now()).await
    }

    /// Files sent by `email` that have not expired at `now`.
    pub async fn for_sender_at(&self, email: &str, now: DateTime<Utc>) -> Result<Vec<SharedFile>> {
        let sql = format!(
            "SELECT {FILE_COLUMNS} FROM shared_files
             WHERE sender_email = ? COLLATE NOCASE AND expires_at > ?
             ORDER BY id DESC"
        );
        sqlx::query_as::<_, SharedFile>(&sql)
            .bind(email)
            .bind(to_db(&now))
            .fetch_all(self.pool)
            .await
            .map_err(|e| FileshareError::Database(e.to_string()))
    }

    /// Delete the metadata row. Returns `false` if it was already gone.
    pub async fn remove(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM shared_files WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| FileshareError::Database(e.to_string()))?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;
    use chrono::TimeZone;

    fn upload(stored_name: &str, sender: &str, recipient: &str, days: i64) -> NewSharedFile {
        NewSharedFile {
            doc_name: "report.pdf".to_string(),
            stored_name: stored_name.to_string(),
            size: 42,
            sender_name: "Cheryl Smith".to_string(),
            sender_email: sender.to_string(),
            recipient_name: "Foo Bar".to_string(),
            recipient_email: recipient.to_string(),
            password_hash: "hash".to_string(),
            expires_in_days: days,
        }
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_insert_sets_expiry() {
        let db = Database::open_in_memory().await.unwrap();
        let repo = SharedFileRepository::new(db.pool());

        let id = repo
            .insert_at(&upload("a.pdf", "cheryl@example.com", "foo@bar.com", 365), t0())
            .await
            .unwrap();

        let file = repo.get_at(id, t0()).await.unwrap();
        assert_eq!(file.created_at, "2024-03-01 12:00:00");
        assert_eq!(file.expires_at, "2025-03-01 12:00:00");
        assert_eq!(file.sender_name, "Cheryl Smith");
        assert_eq!(file.recipient_email, "foo@bar.com");
    }

    #[tokio::test]
    async fn test_get_after_expiry_is_not_found() {
        let db = Database::open_in_memory().await.unwrap();
        let repo = SharedFileRepository::new(db.pool());

        let id = repo
            .insert_at(&upload("a.pdf", "cheryl@example.com", "foo@bar.com", 365), t0())
            .await
            .unwrap();

        assert!(repo.get_at(id, t0() + Duration::days(364)).await.is_ok());
        assert!(matches!(
            repo.get_at(id, t0() + Duration::days(366)).await,
            Err(FileshareError::NotFound(_))
        ));
        // Exactly at the expiry instant the file is gone.
        assert!(repo.get_at(id, t0() + Duration::days(365)).await.is_err());
        // get_any still sees it.
        assert_eq!(repo.get_any(id).await.unwrap().id, id);
    }

    #[tokio::test]
    async fn test_get_missing() {
        let db = Database::open_in_memory().await.unwrap();
        let repo = SharedFileRepository::new(db.pool());

        assert!(matches!(repo.get(1).await, Err(FileshareError::NotFound(_))));
        assert!(matches!(
            repo.get_any(-1).await,
            Err(FileshareError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_inserted_file_is_visible_now() {
        let db = Database::open_in_memory().await.unwrap();
        let repo = SharedFileRepository::new(db.pool());

        let id = repo
            .insert(&upload("a.pdf", "s@example.com", "r@example.com", 1))
            .await
            .unwrap();

        assert_eq!(repo.get(id).await.unwrap().id, id);
        assert_eq!(repo.latest(10).await.unwrap()[0].id, id);
        assert_eq!(repo.get_by_stored_name("a.pdf").await.unwrap().id, id);
    }

    #[tokio::test]
    async fn test_latest_orders_and_limits() {
        let db = Database::open_in_memory().await.unwrap();
        let repo = SharedFileRepository::new(db.pool());

        for i in 0..12 {
            repo.insert_at(
                &upload(&format!("{i}.bin"), "s@example.com", "r@example.com", 30),
                t0(),
            )
            .await
            .unwrap();
        }
        // One already expired at t0 + 2 days.
        repo.insert_at(&upload("old.bin", "s@example.com", "r@example.com", 1), t0())
            .await
            .unwrap();

        let latest = repo.latest_at(10, t0() + Duration::days(2)).await.unwrap();
        assert_eq!(latest.len(), 10);
        assert_eq!(latest[0].stored_name, "11.bin");
        assert!(latest.windows(2).all(|w| w[0].id > w[1].id));
        assert!(latest.iter().all(|f| f.stored_name != "old.bin"));
    }

    #[tokio::test]
    async fn test_role_filtered_views() {
        let db = Database::open_in_memory().await.unwrap();
        let repo = SharedFileRepository::new(db.pool());

        repo.insert_at(&upload("1.bin", "alice@example.com", "bob@example.com", 30), t0())
            .await
            .unwrap();
        repo.insert_at(&upload("2.bin", "alice@example.com", "carol@example.com", 30), t0())
            .await
            .unwrap();
        repo.insert_at(&upload("3.bin", "dave@example.com", "BOB@example.com", 30), t0())
            .await
            .unwrap();
        repo.insert_at(&upload("4.bin", "alice@example.com", "bob@example.com", 1), t0())
            .await
            .unwrap();

        let later = t0() + Duration::days(5);

        let to_bob = repo.for_recipient_at("bob@example.com", later).await.unwrap();
        let names: Vec<_> = to_bob.iter().map(|f| f.stored_name.as_str()).collect();
        assert_eq!(names, vec!["3.bin", "1.bin"]);

        let from_alice = repo.for_sender_at("Alice@example.com", later).await.unwrap();
        let names: Vec<_> = from_alice.iter().map(|f| f.stored_name.as_str()).collect();
        assert_eq!(names, vec!["2.bin", "1.bin"]);
    }

    #[tokio::test]
    async fn test_remove() {
        let db = Database::open_in_memory().await.unwrap();
        let repo = SharedFileRepository::new(db.pool());

        let id = repo
            .insert(&upload("a.pdf", "s@example.com", "r@example.com", 1))
            .await
            .unwrap();

        assert!(repo.remove(id).await.unwrap());
        assert!(!repo.remove(id).await.unwrap());
        assert!(repo.get_any(id).await.is_err());
    }

    #[test]
    fn test_sender_and_recipient_checks() {
        let file = SharedFile {
            id: 1,
            doc_name: "a".to_string(),
            stored_name: "a".to_string(),
            size: 0,
            sender_name: "S".to_string(),
            sender_email: "s@example.com".to_string(),
            recipient_name: "R".to_string(),
            recipient_email: "r@example.com".to_string(),
            password_hash: String::new(),
            created_at: String::new(),
            expires_at: String::new(),
        };

        assert!(file.is_sender("S@example.com"));
        assert!(!file.is_sender("r@example.com"));
        assert!(file.is_recipient("r@EXAMPLE.com"));
    }
}
