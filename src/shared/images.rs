use uuid::Uuid;

use crate::core::error::AppError;
use crate::core::extractor::UploadedImage;

/// Allowed MIME types for catalog images
pub const ALLOWED_IMAGE_TYPES: &[&str] = &["image/jpeg", "image/png", "image/gif", "image/webp"];

/// Maximum image size in bytes (10MB)
pub const MAX_IMAGE_SIZE: usize = 10 * 1024 * 1024;

/// Get file extension from content type
pub fn extension_for(content_type: &str) -> Option<&'static str> {
    match content_type {
        "image/jpeg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/gif" => Some("gif"),
        "image/webp" => Some("webp"),
        _ => None,
    }
}

/// Content type to serve a stored file with, from its extension
pub fn content_type_for(path: &str) -> &'static str {
    let extension = path
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        _ => "application/octet-stream",
    }
}

/// Field error for an image over [`MAX_IMAGE_SIZE`]
pub fn image_too_large() -> AppError {
    AppError::field(
        "image",
        "max",
        format!(
            "The image may not be greater than {} kilobytes.",
            MAX_IMAGE_SIZE / 1024
        ),
    )
}

/// Reject uploads with a disallowed type or size, as a field error on `image`
pub fn validate_upload(image: &UploadedImage) -> Result<(), AppError> {
    if image.data.len() > MAX_IMAGE_SIZE {
        return Err(image_too_large());
    }

    if !ALLOWED_IMAGE_TYPES.contains(&image.content_type.as_str()) {
        return Err(AppError::field(
            "image",
            "mimes",
            format!(
                "The image must be a file of type: {}.",
                ALLOWED_IMAGE_TYPES.join(", ")
            ),
        ));
    }

    Ok(())
}

/// Fresh storage path for an upload, e.g. "categories/<uuid>.png"
pub fn storage_path(dir: &str, image: &UploadedImage) -> String {
    let extension = extension_for(&image.content_type)
        .or_else(|| image.file_name.rsplit_once('.').map(|(_, ext)| ext))
        .unwrap_or("bin");
    format!("{}/{}.{}", dir, Uuid::new_v4(), extension)
}
