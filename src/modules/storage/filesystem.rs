//! Filesystem-backed image storage for development setups
//!
//! The "local" and "public" areas are two directories; public files are
//! published under `{APP_URL}/storage/...`.

use std::path::PathBuf;

use async_trait::async_trait;
use tracing::debug;

use super::{is_safe_path, ImageStorage, StorageArea};
use crate::core::config::FilesystemConfig;
use crate::core::error::AppError;

pub struct FilesystemStorage {
    local_root: PathBuf,
    public_root: PathBuf,
    public_url: String,
}

impl FilesystemStorage {
    pub fn new(config: FilesystemConfig) -> Self {
        Self {
            local_root: config.local_root,
            public_root: config.public_root,
            public_url: config.public_url.trim_end_matches('/').to_string(),
        }
    }

    fn root(&self, area: StorageArea) -> &PathBuf {
        match area {
            StorageArea::Local => &self.local_root,
            StorageArea::Public => &self.public_root,
        }
    }

    /// Absolute location of `path` inside `area`, `None` for unsafe paths
    pub fn resolve_path(&self, area: StorageArea, path: &str) -> Option<PathBuf> {
        if !is_safe_path(path) {
            return None;
        }
        Some(self.root(area).join(path))
    }

    /// Read a file from `area`, `None` if it does not exist
    pub async fn read(&self, area: StorageArea, path: &str) -> Result<Option<Vec<u8>>, AppError> {
        let Some(file_path) = self.resolve_path(area, path) else {
            return Ok(None);
        };

        match tokio::fs::read(&file_path).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Storage(format!(
                "Failed to read '{}': {}",
                file_path.display(),
                e
            ))),
        }
    }

    /// Create both area directories if missing
    pub async fn ensure_roots(&self) -> Result<(), AppError> {
        for root in [&self.local_root, &self.public_root] {
            tokio::fs::create_dir_all(root).await.map_err(|e| {
                AppError::Storage(format!("Failed to create '{}': {}", root.display(), e))
            })?;
        }
        Ok(())
    }
}

#[async_trait]
impl ImageStorage for FilesystemStorage {
    async fn exists(&self, area: StorageArea, path: &str) -> Result<bool, AppError> {
        let Some(file_path) = self.resolve_path(area, path) else {
            return Ok(false);
        };

        match tokio::fs::metadata(&file_path).await {
            Ok(meta) => Ok(meta.is_file()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(AppError::Storage(format!(
                "Failed to stat '{}': {}",
                file_path.display(),
                e
            ))),
        }
    }

    /// Both areas publish under the same base URL; only the public one is served.
    fn public_url(&self, _area: StorageArea, path: &str) -> String {
        format!("{}/{}", self.public_url, path.trim_start_matches('/'))
    }

    async fn put(
        &self,
        area: StorageArea,
        path: &str,
        data: Vec<u8>,
        _content_type: &str,
    ) -> Result<(), AppError> {
        let file_path = self
            .resolve_path(area, path)
            .ok_or_else(|| AppError::BadRequest(format!("Invalid storage path '{}'", path)))?;

        if let Some(parent) = file_path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                AppError::Storage(format!("Failed to create '{}': {}", parent.display(), e))
            })?;
        }

        tokio::fs::write(&file_path, &data).await.map_err(|e| {
            AppError::Storage(format!("Failed to write '{}': {}", file_path.display(), e))
        })?;

        debug!("Stored {} bytes at {}", data.len(), file_path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn temp_storage() -> (FilesystemStorage, PathBuf) {
        let base = std::env::temp_dir().join(format!("catalog-admin-{}", Uuid::new_v4()));
        let storage = FilesystemStorage::new(FilesystemConfig {
            local_root: base.join("app"),
            public_root: base.join("app/public"),
            public_url: "http://localhost:3000/storage/".to_string(),
        });
        (storage, base)
    }

    #[tokio::test]
    async fn test_put_then_exists_per_area() {
        let (storage, base) = temp_storage();

        storage
            .put(StorageArea::Public, "categories/a.png", vec![1, 2, 3], "image/png")
            .await
            .unwrap();

        assert!(storage.exists(StorageArea::Public, "categories/a.png").await.unwrap());
        assert!(!storage.exists(StorageArea::Local, "categories/a.png").await.unwrap());
        assert_eq!(
            storage.read(StorageArea::Public, "categories/a.png").await.unwrap(),
            Some(vec![1, 2, 3])
        );
        assert_eq!(storage.read(StorageArea::Public, "missing.png").await.unwrap(), None);

        let _ = std::fs::remove_dir_all(base);
    }

    #[tokio::test]
    async fn test_unsafe_paths_never_exist() {
        let (storage, _base) = temp_storage();
        assert!(!storage.exists(StorageArea::Local, "../etc/passwd").await.unwrap());
        assert!(storage
            .put(StorageArea::Public, "/abs.png", vec![], "image/png")
            .await
            .is_err());
    }

    #[test]
    fn test_public_url() {
        let (storage, _base) = temp_storage();
        assert_eq!(
            storage.public_url(StorageArea::Public, "products/p.jpg"),
            "http://localhost:3000/storage/products/p.jpg"
        );
    }
}
