use std::sync::Arc;

use tracing::warn;

use super::{ImageStorage, StorageArea};

/// Turns an entity's optional `image` path into the URL clients should load
///
/// Shared by categories and products. Every call performs existence checks
/// against storage; nothing is cached.
#[derive(Clone)]
pub struct ImageUrlResolver {
    storage: Arc<dyn ImageStorage>,
    default_image_url: String,
}

impl ImageUrlResolver {
    pub fn new(storage: Arc<dyn ImageStorage>, default_image_url: impl Into<String>) -> Self {
        Self {
            storage,
            default_image_url: default_image_url.into(),
        }
    }

    /// Resolution order: no image -> default asset; found on local -> local URL;
    /// found on public -> public URL; otherwise the public URL of the raw path,
    /// even though the file could not be confirmed.
    pub async fn resolve(&self, image: Option<&str>) -> String {
        let path = match image.map(str::trim).filter(|p| !p.is_empty()) {
            Some(p) => p,
            None => return self.default_image_url.clone(),
        };

        for area in [StorageArea::Local, StorageArea::Public] {
            if self.exists(area, path).await {
                return self.storage.public_url(area, path);
            }
        }

        self.storage.public_url(StorageArea::Public, path)
    }

    async fn exists(&self, area: StorageArea, path: &str) -> bool {
        match self.storage.exists(area, path).await {
            Ok(found) => found,
            Err(e) => {
                warn!(
                    "Existence check failed for '{}' on {} area, treating as missing: {}",
                    path,
                    area.as_str(),
                    e
                );
                false
            }
        }
    }
}
