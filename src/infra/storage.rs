//! Uploaded file storage.

use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use uuid::Uuid;

use crate::domain::document::sanitize_filename;
use crate::errors::{AppError, AppResult};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Store `bytes` for `owner` and return the storage path to persist.
    async fn save(&self, owner: Uuid, filename: &str, bytes: Vec<u8>) -> AppResult<String>;

    async fn read(&self, storage_path: &str) -> AppResult<Vec<u8>>;

    /// Missing files are ignored.
    async fn remove(&self, storage_path: &str) -> AppResult<()>;
}

/// Files under `<root>/<owner>/<uuid>-<name>`.
pub struct LocalFileStore {
    root: PathBuf,
}

impl LocalFileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, storage_path: &str) -> AppResult<PathBuf> {
        let relative = Path::new(storage_path);
        let safe = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        if !safe {
            return Err(AppError::bad_request("Invalid storage path"));
        }
        Ok(self.root.join(relative))
    }
}

fn io_error(e: std::io::Error) -> AppError {
    AppError::internal(format!("File storage error: {}", e))
}

#[async_trait]
impl FileStore for LocalFileStore {
    async fn save(&self, owner: Uuid, filename: &str, bytes: Vec<u8>) -> AppResult<String> {
        let storage_path = format!(
            "{}/{}-{}",
            owner,
            Uuid::new_v4(),
            sanitize_filename(filename)
        );
        let path = self.resolve(&storage_path)?;
        if let Some(dir) = path.parent() {
            tokio::fs::create_dir_all(dir).await.map_err(io_error)?;
        }
        tokio::fs::write(&path, bytes).await.map_err(io_error)?;
        tracing::debug!(path = %path.display(), "Stored upload");
        Ok(storage_path)
    }

    async fn read(&self, storage_path: &str) -> AppResult<Vec<u8>> {
        let path = self.resolve(storage_path)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(AppError::not_found("File not found"))
            }
            Err(e) => Err(io_error(e)),
        }
    }

    async fn remove(&self, storage_path: &str) -> AppResult<()> {
        let path = self.resolve(storage_path)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> LocalFileStore {
        LocalFileStore::new(std::env::temp_dir().join(format!("voluntalia-{}", Uuid::new_v4())))
    }

    #[tokio::test]
    async fn save_read_remove() {
        let store = store();
        let owner = Uuid::new_v4();
        let path = store
            .save(owner, "../../etc/passwd", b"hello".to_vec())
            .await
            .unwrap();

        assert!(path.starts_with(&owner.to_string()));
        assert!(path.ends_with("-passwd"));
        assert_eq!(store.read(&path).await.unwrap(), b"hello");

        store.remove(&path).await.unwrap();
        assert!(matches!(store.read(&path).await, Err(AppError::NotFound(_))));
        store.remove(&path).await.unwrap();
    }

    #[tokio::test]
    async fn traversal_is_rejected() {
        let store = store();
        assert!(matches!(
            store.read("../secret").await,
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            store.read("/etc/passwd").await,
            Err(AppError::BadRequest(_))
        ));
    }
}
