use axum::{
    extract::{
        multipart::{Field, MultipartError},
        FromRequest, Multipart, Request,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::collections::HashMap;
use tracing::debug;

use crate::core::error::AppError;
use crate::shared::images::image_too_large;

/// An image file submitted alongside a catalog form
#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub file_name: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

/// Text fields and the optional `image` file of a multipart/form-data body
///
/// Empty text fields are treated as absent, the way HTML forms submit
/// untouched inputs. Nullable fields can still tell a blank submission apart
/// from an omitted one, so an update can clear them.
#[derive(Debug, Default)]
pub struct CatalogForm {
    fields: HashMap<String, String>,
    pub image: Option<UploadedImage>,
}

impl CatalogForm {
    pub fn from_parts(fields: HashMap<String, String>, image: Option<UploadedImage>) -> Self {
        Self { fields, image }
    }

    /// Raw text value, `None` when missing or blank
    pub fn text(&self, name: &str) -> Option<String> {
        self.fields
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .map(|v| v.to_string())
    }

    /// Value of a nullable field: `None` when the field was not submitted,
    /// `Some(None)` when it was submitted blank
    pub fn nullable_text(&self, name: &str) -> Option<Option<String>> {
        self.fields.contains_key(name).then(|| self.text(name))
    }

    /// [`Self::parsed`] for a nullable field
    pub fn nullable_parsed<T: std::str::FromStr>(
        &self,
        name: &str,
    ) -> Result<Option<Option<T>>, AppError> {
        if !self.fields.contains_key(name) {
            return Ok(None);
        }
        self.parsed(name).map(Some)
    }

    /// Checkbox-style boolean: "1", "true", "on", "yes" are true
    pub fn flag(&self, name: &str) -> Result<Option<bool>, AppError> {
        match self.text(name) {
            None => Ok(None),
            Some(v) => match v.to_lowercase().as_str() {
                "1" | "true" | "on" | "yes" => Ok(Some(true)),
                "0" | "false" | "off" | "no" => Ok(Some(false)),
                _ => Err(AppError::field(
                    field_name(name),
                    "boolean",
                    format!("The {} field must be true or false.", name),
                )),
            },
        }
    }

    /// Parse a text value with `FromStr`, reporting failures against the field
    pub fn parsed<T: std::str::FromStr>(&self, name: &str) -> Result<Option<T>, AppError> {
        match self.text(name) {
            None => Ok(None),
            Some(v) => v.parse::<T>().map(Some).map_err(|_| {
                AppError::field(
                    field_name(name),
                    "format",
                    format!("The {} field has an invalid format.", name),
                )
            }),
        }
    }
}

/// Validator keys need `'static` names; form fields come from this fixed set
fn field_name(name: &str) -> &'static str {
    match name {
        "name" => "name",
        "slug" => "slug",
        "description" => "description",
        "status" => "status",
        "unit_price" => "unit_price",
        "sale_price" => "sale_price",
        "category_id" => "category_id",
        "image" => "image",
        _ => "form",
    }
}

/// A body cut off by the request size limit is reported against `image`,
/// the only field that can grow that large
fn read_error(e: MultipartError, what: &str) -> AppError {
    debug!("Failed to read {}: {}", what, e);
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return image_too_large();
    }
    AppError::BadRequest(format!("Failed to read {}: {}", what, e))
}

async fn read_image(field: Field<'_>) -> Result<Option<UploadedImage>, AppError> {
    let content_type = field
        .content_type()
        .map(|s| s.to_string())
        .unwrap_or_else(|| "application/octet-stream".to_string());

    let file_name = field
        .file_name()
        .map(|s| s.to_string())
        .unwrap_or_else(|| "unnamed".to_string());

    let data = field
        .bytes()
        .await
        .map_err(|e| read_error(e, "image data"))?;

    // Browsers send an empty part when no file was chosen
    if data.is_empty() {
        return Ok(None);
    }

    Ok(Some(UploadedImage {
        file_name,
        content_type,
        data: data.to_vec(),
    }))
}

impl<S> FromRequest<S> for CatalogForm
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let mut multipart = Multipart::from_request(req, state).await.map_err(|rejection| {
            AppError::BadRequest(format!("Expected multipart/form-data: {}", rejection))
                .into_response()
        })?;

        let mut fields = HashMap::new();
        let mut image = None;

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| read_error(e, "multipart data").into_response())?
        {
            let name = field.name().unwrap_or("").to_string();

            if name == "image" {
                image = read_image(field).await.map_err(IntoResponse::into_response)?;
                continue;
            }

            let text = field
                .text()
                .await
                .map_err(|e| read_error(e, &format!("{} field", name)).into_response())?;
            fields.insert(name, text);
        }

        Ok(Self { fields, image })
    }
}
