//! MinIO/S3-compatible image storage
//!
//! Both storage areas share one bucket and are told apart by key prefix
//! (e.g. `local/categories/x.png`, `public/categories/x.png`).
//!
//! Uses rust-s3 crate for lightweight S3 operations.

use async_trait::async_trait;
use s3::creds::Credentials;
use s3::{Bucket, BucketConfiguration, Region};
use tracing::{debug, info, warn};

use super::{is_safe_path, ImageStorage, StorageArea};
use crate::core::config::MinIOConfig;
use crate::core::error::AppError;

/// MinIO/S3-compatible storage client
pub struct MinIOClient {
    bucket: Box<Bucket>,
    region: Region,
    credentials: Credentials,
    endpoint: String,
    public_endpoint: String,
    public_prefix: String,
    local_prefix: String,
}

impl MinIOClient {
    /// Create a new MinIO client from configuration
    ///
    /// The bucket is created if it does not exist yet. Anonymous read access
    /// to the public prefix is expected to be granted by the bucket policy.
    pub async fn new(config: MinIOConfig) -> Result<Self, AppError> {
        let credentials = Credentials::new(
            Some(&config.access_key),
            Some(&config.secret_key),
            None,
            None,
            None,
        )
        .map_err(|e| AppError::Storage(format!("Failed to create MinIO credentials: {}", e)))?;

        let region = Region::Custom {
            region: config.region.clone(),
            endpoint: config.endpoint.clone(),
        };

        let mut bucket = Bucket::new(&config.bucket, region.clone(), credentials.clone())
            .map_err(|e| AppError::Storage(format!("Failed to create MinIO bucket: {}", e)))?;

        // Use path-style URLs for MinIO (http://endpoint/bucket instead of http://bucket.endpoint)
        bucket.set_path_style();

        let client = Self {
            bucket,
            region,
            credentials,
            endpoint: config.endpoint,
            public_endpoint: config.public_endpoint.trim_end_matches('/').to_string(),
            public_prefix: config.public_prefix,
            local_prefix: config.local_prefix,
        };

        client.ensure_bucket_exists().await?;

        info!(
            "MinIO client initialized for endpoint: {}, bucket: {}, public_prefix: {}, local_prefix: {}",
            client.endpoint, client.bucket.name(), client.public_prefix, client.local_prefix
        );

        Ok(client)
    }

    /// Ensure the bucket exists, create if not
    pub async fn ensure_bucket_exists(&self) -> Result<(), AppError> {
        // Try to create bucket - if it already exists, MinIO will return an error
        // which we can safely ignore
        match self.create_bucket().await {
            Ok(_) => {
                info!("Bucket '{}' created successfully", self.bucket.name());
                Ok(())
            }
            Err(e) => {
                let error_str = e.to_string();
                if error_str.contains("BucketAlreadyOwnedByYou")
                    || error_str.contains("BucketAlreadyExists")
                    || error_str.contains("already own it")
                {
                    debug!("Bucket '{}' already exists", self.bucket.name());
                } else {
                    warn!(
                        "Could not create bucket '{}': {}. Assuming it exists.",
                        self.bucket.name(),
                        e
                    );
                }
                Ok(())
            }
        }
    }

    async fn create_bucket(&self) -> Result<(), AppError> {
        Bucket::create_with_path_style(
            &self.bucket.name(),
            self.region.clone(),
            self.credentials.clone(),
            BucketConfiguration::default(),
        )
        .await
        .map_err(|e| {
            AppError::Storage(format!(
                "Failed to create bucket '{}': {}",
                self.bucket.name(),
                e
            ))
        })?;

        Ok(())
    }

    pub fn bucket_name(&self) -> String {
        self.bucket.name()
    }

    /// Object key for `path` inside `area`, e.g. "public/categories/x.png"
    pub fn key_for(&self, area: StorageArea, path: &str) -> String {
        let prefix = match area {
            StorageArea::Local => &self.local_prefix,
            StorageArea::Public => &self.public_prefix,
        };
        format!("{}/{}", prefix, path.trim_start_matches('/'))
    }
}

#[async_trait]
impl ImageStorage for MinIOClient {
    async fn exists(&self, area: StorageArea, path: &str) -> Result<bool, AppError> {
        if !is_safe_path(path) {
            return Ok(false);
        }

        let key = self.key_for(area, path);
        match self.bucket.head_object(&key).await {
            Ok((_, status)) => Ok((200..300).contains(&status)),
            Err(e) => {
                let error_str = e.to_string();
                if error_str.contains("404") || error_str.contains("NoSuchKey") {
                    Ok(false)
                } else {
                    Err(AppError::Storage(format!(
                        "Failed to check if file '{}' exists: {}",
                        key, e
                    )))
                }
            }
        }
    }

    fn public_url(&self, area: StorageArea, path: &str) -> String {
        format!(
            "{}/{}/{}",
            self.public_endpoint,
            self.bucket.name(),
            self.key_for(area, path)
        )
    }

    async fn put(
        &self,
        area: StorageArea,
        path: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<(), AppError> {
        if !is_safe_path(path) {
            return Err(AppError::BadRequest(format!("Invalid storage path '{}'", path)));
        }

        let key = self.key_for(area, path);
        let response = self
            .bucket
            .put_object_with_content_type(&key, &data, content_type)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to upload file '{}': {}", key, e)))?;

        let status = response.status_code();
        if !(200..300).contains(&status) {
            return Err(AppError::Storage(format!(
                "Failed to upload file '{}': status {}",
                key, status
            )));
        }

        debug!(
            "Uploaded file '{}' ({} bytes) to bucket '{}'",
            key,
            data.len(),
            self.bucket.name()
        );
        Ok(())
    }
}
