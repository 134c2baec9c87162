use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use tracing::debug;

use super::{is_safe_path, FilesystemStorage, StorageArea};
use crate::core::error::{AppError, Result};
use crate::shared::images::content_type_for;

/// Serve a file from the public storage area
#[utoipa::path(
    get,
    path = "/storage/{path}",
    params(
        ("path" = String, Path, description = "Path inside the public area, e.g. categories/x.png")
    ),
    responses(
        (status = 200, description = "File content"),
        (status = 400, description = "Invalid path"),
        (status = 404, description = "File not found")
    ),
    tag = "storage"
)]
pub async fn serve_public_file(
    State(storage): State<Arc<FilesystemStorage>>,
    Path(path): Path<String>,
) -> Result<Response> {
    if !is_safe_path(&path) {
        return Err(AppError::BadRequest("Invalid file path".to_string()));
    }

    let content = storage
        .read(StorageArea::Public, &path)
        .await?
        .ok_or_else(|| {
            debug!("Public file not found: {}", path);
            AppError::NotFound(format!("File '{}' not found", path))
        })?;

    Ok(([(header::CONTENT_TYPE, content_type_for(&path))], content).into_response())
}

/// Public file route, mounted only for the filesystem driver
pub fn routes(storage: Arc<FilesystemStorage>) -> Router {
    Router::new()
        .route("/storage/{*path}", get(serve_public_file))
        .with_state(storage)
}
