//! Storage module for catalog images
//!
//! Images live in one of two areas: "local" (not meant to be served
//! directly) and "public". Callers only see the [`ImageStorage`] trait;
//! the MinIO and filesystem backends implement it.

mod filesystem;
mod minio_client;
mod resolver;
pub mod routes;

use async_trait::async_trait;

use crate::core::error::AppError;

pub use filesystem::FilesystemStorage;
pub use minio_client::MinIOClient;
pub use resolver::ImageUrlResolver;

/// Named storage area an image may live in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageArea {
    Local,
    Public,
}

impl StorageArea {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageArea::Local => "local",
            StorageArea::Public => "public",
        }
    }
}

/// Storage capability injected into services and the image resolver
#[async_trait]
pub trait ImageStorage: Send + Sync {
    /// Whether `path` exists in `area`
    async fn exists(&self, area: StorageArea, path: &str) -> Result<bool, AppError>;

    /// URL under which `path` in `area` is published. Does not check existence.
    fn public_url(&self, area: StorageArea, path: &str) -> String;

    /// Write `data` to `path` in `area`, replacing any existing file
    async fn put(
        &self,
        area: StorageArea,
        path: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<(), AppError>;
}

/// Reject relative paths that could escape a storage root or bucket prefix
pub(crate) fn is_safe_path(path: &str) -> bool {
    !path.is_empty()
        && !path.starts_with('/')
        && !path.contains('\\')
        && path.split('/').all(|segment| !segment.is_empty() && segment != "..")
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_safe_path() {
        assert!(is_safe_path("categories/abc.png"));
        assert!(is_safe_path("images/default.png"));
        assert!(!is_safe_path(""));
        assert!(!is_safe_path("/etc/passwd"));
        assert!(!is_safe_path("../secret.png"));
        assert!(!is_safe_path("categories/../../x"));
        assert!(!is_safe_path("categories//x.png"));
        assert!(!is_safe_path("categories\\x.png"));
    }
}
