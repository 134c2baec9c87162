use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::core::error::Result;
use crate::core::extractor::CatalogForm;
use crate::features::categories::models::{CategoryChanges, NewCategory};

/// Create category form (multipart/form-data)
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateCategoryDto {
    #[validate(length(min = 1, max = 255, message = "The name field is required and may not be greater than 255 characters."))]
    #[schema(example = "Electronics")]
    pub name: String,

    /// Derived from the name when omitted
    #[validate(
        length(max = 255, message = "The slug may not be greater than 255 characters."),
        regex(
            path = *crate::shared::validation::SLUG_REGEX,
            message = "The slug may only contain lowercase letters, digits and single hyphens."
        )
    )]
    #[schema(example = "electronics")]
    pub slug: Option<String>,

    pub description: Option<String>,

    /// Defaults to active
    pub status: Option<bool>,
}

impl CreateCategoryDto {
    pub fn from_form(form: &CatalogForm) -> Result<Self> {
        Ok(Self {
            name: form.text("name").unwrap_or_default(),
            slug: form.text("slug"),
            description: form.text("description"),
            status: form.flag("status")?,
        })
    }

    pub fn into_new_category(self) -> NewCategory {
        NewCategory {
            name: self.name.trim().to_string(),
            slug: self.slug,
            description: self.description,
            image: None,
            status: self.status.unwrap_or(true),
        }
    }
}

/// Update category form (multipart/form-data); omitted fields are left unchanged
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateCategoryDto {
    #[validate(length(min = 1, max = 255, message = "The name field is required and may not be greater than 255 characters."))]
    pub name: String,

    /// Submitted blank to clear the description
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,

    pub status: Option<bool>,
}

impl UpdateCategoryDto {
    pub fn from_form(form: &CatalogForm) -> Result<Self> {
        Ok(Self {
            name: form.text("name").unwrap_or_default(),
            description: form.nullable_text("description"),
            status: form.flag("status")?,
        })
    }
}

impl From<UpdateCategoryDto> for CategoryChanges {
    fn from(dto: UpdateCategoryDto) -> Self {
        Self {
            name: Some(dto.name.trim().to_string()),
            slug: None,
            description: dto.description,
            image: None,
            status: dto.status,
        }
    }
}

/// Multipart body documented for Swagger UI only; handlers read [`CatalogForm`]
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct CategoryFormUpload {
    #[schema(example = "Electronics")]
    pub name: String,
    pub slug: Option<String>,
    pub description: Option<String>,
    #[schema(example = "1")]
    pub status: Option<String>,
    /// Optional image (jpeg, png, gif, webp; max 10MB)
    #[schema(format = Binary, content_media_type = "application/octet-stream")]
    pub image: Option<String>,
}

/// Response DTO for category
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CategoryResponseDto {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    /// Stored path of the image, if any
    pub image: Option<String>,
    /// Resolved URL of the image, falls back to the default asset
    pub image_url: String,
    pub status: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Product as listed under its category
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CategoryProductDto {
    pub id: i64,
    pub name: String,
    pub slug: String,
    #[schema(value_type = String, example = "999.99")]
    pub unit_price: Decimal,
    #[schema(value_type = Option<String>, example = "899.99")]
    pub sale_price: Option<Decimal>,
    pub status: bool,
    pub image_url: String,
}

/// Category with its products
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CategoryDetailDto {
    #[serde(flatten)]
    pub category: CategoryResponseDto,
    pub products: Vec<CategoryProductDto>,
}

/// Values for the create/edit form
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CategoryFormDto {
    /// Present when editing an existing category
    pub id: Option<i64>,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub status: bool,
    pub image_url: Option<String>,
}

impl Default for CategoryFormDto {
    fn default() -> Self {
        Self {
            id: None,
            name: String::new(),
            slug: String::new(),
            description: None,
            status: true,
            image_url: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn form(pairs: &[(&str, &str)]) -> CatalogForm {
        let fields: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        CatalogForm::from_parts(fields, None)
    }

    #[test]
    fn test_create_dto_from_form() {
        let dto = CreateCategoryDto::from_form(&form(&[
            ("name", "Electronics"),
            ("slug", ""),
            ("status", "1"),
        ]))
        .unwrap();
        assert!(dto.validate().is_ok());
        assert_eq!(dto.slug, None);

        let new = dto.into_new_category();
        assert_eq!(new.name, "Electronics");
        assert!(new.status);
    }

    #[test]
    fn test_create_dto_requires_name() {
        let dto = CreateCategoryDto::from_form(&form(&[("description", "x")])).unwrap();
        let errors = dto.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("name"));
    }

    #[test]
    fn test_create_dto_rejects_malformed_slug() {
        let dto = CreateCategoryDto::from_form(&form(&[
            ("name", "Electronics"),
            ("slug", "Not A Slug"),
        ]))
        .unwrap();
        let errors = dto.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("slug"));
    }

    #[test]
    fn test_create_dto_rejects_long_name() {
        let long = "x".repeat(256);
        let dto = CreateCategoryDto::from_form(&form(&[("name", long.as_str())])).unwrap();
        assert!(dto.validate().is_err());
    }

    #[test]
    fn test_update_dto_into_changes() {
        let dto = UpdateCategoryDto::from_form(&form(&[
            ("name", " Gadgets "),
            ("status", "false"),
        ]))
        .unwrap();
        assert!(dto.validate().is_ok());

        let changes = CategoryChanges::from(dto);
        assert_eq!(changes.name.as_deref(), Some("Gadgets"));
        assert_eq!(changes.status, Some(false));
        assert_eq!(changes.description, None);
        assert_eq!(changes.slug, None);
    }

    #[test]
    fn test_update_dto_blank_description_clears_it() {
        let dto = UpdateCategoryDto::from_form(&form(&[
            ("name", "Gadgets"),
            ("description", ""),
        ]))
        .unwrap();
        assert_eq!(CategoryChanges::from(dto).description, Some(None));
    }
}
