//! Blob storage for uploaded files.
//!
//! Uploads are written under generated UUID names, so two uploads with the
//! same original filename never overwrite each other. Layout:
//!
//! ```text
//! {base_path}/
//! ├── 3f/
//! │   └── 3f2b9c1e-0d4a-4b6e-9a51-2c7d8e9f0a1b.pdf
//! └── a0/
//!     └── a07c...-....bin
//! ```

use std::io;
use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::{FileshareError, Result};

/// Longest extension kept from the original filename.
const MAX_EXTENSION_LENGTH: usize = 10;

/// On-disk store for uploaded bytes.
#[derive(Debug, Clone)]
pub struct FileStorage {
    base_path: PathBuf,
}

impl FileStorage {
    /// Create a storage rooted at `base_path`, creating the directory.
    pub fn new(base_path: impl Into<PathBuf>) -> Result<Self> {
        let base_path = base_path.into();
        std::fs::create_dir_all(&base_path)?;
        Ok(Self { base_path })
    }

    /// Root directory of this storage.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Write `content` under a fresh name and return that name.
    pub async fn save(&self, content: &[u8], original_name: &str) -> Result<String> {
        let stored_name = Self::generate_stored_name(original_name);
        let path = self.path_for(&stored_name)?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, content).await?;

        Ok(stored_name)
    }

    /// Read a stored file. Fails with `NotFound` if it is missing.
    pub async fn load(&self, stored_name: &str) -> Result<Vec<u8>> {
        let path = self.path_for(stored_name)?;
        match tokio::fs::read(&path).await {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(FileshareError::NotFound(format!("stored file {stored_name}")))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Remove a stored file. Returns `false` if it was already gone.
    pub async fn delete(&self, stored_name: &str) -> Result<bool> {
        let path = self.path_for(stored_name)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Full path of a stored name: `{base}/{first two chars}/{name}`.
    ///
    /// Names that this storage could not have generated are rejected, which
    /// keeps request-supplied names inside the base directory.
    pub fn path_for(&self, stored_name: &str) -> Result<PathBuf> {
        if !Self::is_valid_stored_name(stored_name) {
            return Err(FileshareError::Validation(format!(
                "invalid stored name: {stored_name}"
            )));
        }
        Ok(self.base_path.join(&stored_name[..2]).join(stored_name))
    }

    /// `<uuid>.<alnum ext>`
    pub fn is_valid_stored_name(stored_name: &str) -> bool {
        let Some((stem, ext)) = stored_name.split_once('.') else {
            return false;
        };
        Uuid::parse_str(stem).is_ok()
            && stem.len() == 36
            && !ext.is_empty()
            && ext.len() <= MAX_EXTENSION_LENGTH
            && ext.chars().all(|c| c.is_ascii_alphanumeric())
    }

    fn generate_stored_name(original_name: &str) -> String {
        let ext = Path::new(original_name)
            .extension()
            .and_then(|s| s.to_str())
            .filter(|ext| {
                !ext.is_empty()
                    && ext.len() <= MAX_EXTENSION_LENGTH
                    && ext.chars().all(|c| c.is_ascii_alphanumeric())
            })
            .unwrap_or("bin");
        format!("{}.{ext}", Uuid::new_v4())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup_storage() -> (TempDir, FileStorage) {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileStorage::new(temp_dir.path().join("uploads")).unwrap();
        (temp_dir, storage)
    }

    #[test]
    fn test_new_creates_directory() {
        let (temp_dir, storage) = setup_storage();
        assert!(temp_dir.path().join("uploads").is_dir());
        assert_eq!(storage.base_path(), temp_dir.path().join("uploads"));
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let (_temp_dir, storage) = setup_storage();

        let stored_name = storage.save(b"Hello, World!", "report.pdf").await.unwrap();
        assert!(stored_name.ends_with(".pdf"));
        assert!(FileStorage::is_valid_stored_name(&stored_name));

        let loaded = storage.load(&stored_name).await.unwrap();
        assert_eq!(loaded, b"Hello, World!");
    }

    #[tokio::test]
    async fn test_same_original_name_does_not_collide() {
        let (_temp_dir, storage) = setup_storage();

        let first = storage.save(b"first", "notes.txt").await.unwrap();
        let second = storage.save(b"second", "notes.txt").await.unwrap();

        assert_ne!(first, second);
        assert_eq!(storage.load(&first).await.unwrap(), b"first");
        assert_eq!(storage.load(&second).await.unwrap(), b"second");
    }

    #[tokio::test]
    async fn test_odd_extensions_become_bin() {
        let (_temp_dir, storage) = setup_storage();

        assert!(storage.save(b"x", "noext").await.unwrap().ends_with(".bin"));
        assert!(storage
            .save(b"x", "weird.t@r")
            .await
            .unwrap()
            .ends_with(".bin"));
        assert!(storage
            .save(b"x", "long.extensionthatistoolong")
            .await
            .unwrap()
            .ends_with(".bin"));
    }

    #[tokio::test]
    async fn test_delete() {
        let (_temp_dir, storage) = setup_storage();

        let stored_name = storage.save(b"bytes", "a.txt").await.unwrap();
        assert!(storage.delete(&stored_name).await.unwrap());
        assert!(!storage.delete(&stored_name).await.unwrap());
        assert!(matches!(
            storage.load(&stored_name).await,
            Err(FileshareError::NotFound(_))
        ));
    }

    #[test]
    fn test_path_for_rejects_traversal() {
        let (_temp_dir, storage) = setup_storage();

        for name in ["../etc/passwd", "..", "", "abc.txt", "x/../../y.txt"] {
            assert!(matches!(
                storage.path_for(name),
                Err(FileshareError::Validation(_))
            ));
        }
    }

    #[test]
    fn test_path_for_shards_by_prefix() {
        let (_temp_dir, storage) = setup_storage();
        let name = "3f2b9c1e-0d4a-4b6e-9a51-2c7d8e9f0a1b.pdf";

        let path = storage.path_for(name).unwrap();
        assert_eq!(path, storage.base_path().join("3f").join(name));
    }
}
