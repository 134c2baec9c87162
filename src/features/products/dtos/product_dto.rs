use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::core::error::{AppError, Result};
use crate::core::extractor::CatalogForm;
use crate::features::products::models::{NewProduct, ProductChanges};

fn non_negative_price(price: &Decimal) -> std::result::Result<(), ValidationError> {
    if *price < Decimal::ZERO {
        return Err(ValidationError::new("min")
            .with_message("The price must be at least 0.".into()));
    }
    Ok(())
}

fn required(message: &'static str) -> ValidationError {
    ValidationError::new("required").with_message(message.into())
}

/// Create product form (multipart/form-data)
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateProductDto {
    #[validate(length(min = 1, max = 255, message = "The name field is required and may not be greater than 255 characters."))]
    #[schema(example = "Smartphone")]
    pub name: String,

    #[validate(
        length(min = 1, max = 255, message = "The slug field is required and may not be greater than 255 characters."),
        regex(
            path = *crate::shared::validation::SLUG_REGEX,
            message = "The slug may only contain lowercase letters, digits and single hyphens."
        )
    )]
    #[schema(example = "smartphone")]
    pub slug: String,

    pub description: Option<String>,

    /// Required
    #[validate(custom(function = "non_negative_price"))]
    #[schema(value_type = Option<String>, example = "999.99")]
    pub unit_price: Option<Decimal>,

    #[validate(custom(function = "non_negative_price"))]
    #[schema(value_type = Option<String>, example = "899.99")]
    pub sale_price: Option<Decimal>,

    /// Defaults to active
    pub status: Option<bool>,

    /// Required
    pub category_id: Option<i64>,
}

impl CreateProductDto {
    pub fn from_form(form: &CatalogForm) -> Result<Self> {
        Ok(Self {
            name: form.text("name").unwrap_or_default(),
            slug: form.text("slug").unwrap_or_default(),
            description: form.text("description"),
            unit_price: form.parsed("unit_price")?,
            sale_price: form.parsed("sale_price")?,
            status: form.flag("status")?,
            category_id: form.parsed("category_id")?,
        })
    }

    /// Validate the form and build the insert values
    ///
    /// Missing required fields are reported together with the rule-based errors.
    pub fn into_new_product(self) -> Result<NewProduct> {
        let mut errors = self.validate().err().unwrap_or_else(ValidationErrors::new);
        if self.unit_price.is_none() {
            errors.add("unit_price", required("The unit price field is required."));
        }
        if self.category_id.is_none() {
            errors.add("category_id", required("The category id field is required."));
        }

        match (self.unit_price, self.category_id) {
            (Some(unit_price), Some(category_id)) if errors.is_empty() => Ok(NewProduct {
                name: self.name.trim().to_string(),
                slug: self.slug,
                description: self.description,
                unit_price,
                sale_price: self.sale_price,
                image: None,
                status: self.status.unwrap_or(true),
                category_id,
            }),
            _ => Err(AppError::InvalidFields(errors)),
        }
    }
}

/// Update product form (multipart/form-data); omitted fields are left unchanged
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateProductDto {
    #[validate(length(min = 1, max = 255, message = "The name field is required and may not be greater than 255 characters."))]
    pub name: String,

    #[validate(
        length(max = 255, message = "The slug may not be greater than 255 characters."),
        regex(
            path = *crate::shared::validation::SLUG_REGEX,
            message = "The slug may only contain lowercase letters, digits and single hyphens."
        )
    )]
    pub slug: Option<String>,

    /// Submitted blank to clear the description
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,

    #[validate(custom(function = "non_negative_price"))]
    #[schema(value_type = Option<String>)]
    pub unit_price: Option<Decimal>,

    /// Submitted blank to take the product off sale
    #[validate(custom(function = "non_negative_price"))]
    #[schema(value_type = Option<String>)]
    pub sale_price: Option<Option<Decimal>>,

    pub status: Option<bool>,

    pub category_id: Option<i64>,
}

impl UpdateProductDto {
    pub fn from_form(form: &CatalogForm) -> Result<Self> {
        Ok(Self {
            name: form.text("name").unwrap_or_default(),
            slug: form.text("slug"),
            description: form.nullable_text("description"),
            unit_price: form.parsed("unit_price")?,
            sale_price: form.nullable_parsed("sale_price")?,
            status: form.flag("status")?,
            category_id: form.parsed("category_id")?,
        })
    }
}

impl From<UpdateProductDto> for ProductChanges {
    fn from(dto: UpdateProductDto) -> Self {
        Self {
            name: Some(dto.name.trim().to_string()),
            slug: dto.slug,
            description: dto.description,
            unit_price: dto.unit_price,
            sale_price: dto.sale_price,
            image: None,
            status: dto.status,
            category_id: dto.category_id,
        }
    }
}

/// Multipart body documented for Swagger UI only; handlers read [`CatalogForm`]
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct ProductFormUpload {
    #[schema(example = "Smartphone")]
    pub name: String,
    #[schema(example = "smartphone")]
    pub slug: String,
    pub description: Option<String>,
    #[schema(example = "999.99")]
    pub unit_price: String,
    #[schema(example = "899.99")]
    pub sale_price: Option<String>,
    #[schema(example = "1")]
    pub status: Option<String>,
    #[schema(example = 1)]
    pub category_id: i64,
    /// Optional image (jpeg, png, gif, webp; max 10MB)
    #[schema(format = Binary, content_media_type = "application/octet-stream")]
    pub image: Option<String>,
}

/// Category a product belongs to
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProductCategoryDto {
    pub id: i64,
    pub name: String,
    pub slug: String,
}

/// Response DTO for product
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProductResponseDto {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    #[schema(value_type = String, example = "999.99")]
    pub unit_price: Decimal,
    #[schema(value_type = Option<String>, example = "899.99")]
    pub sale_price: Option<Decimal>,
    /// Sale price when set, otherwise the unit price
    #[schema(value_type = String, example = "899.99")]
    pub effective_price: Decimal,
    pub on_sale: bool,
    /// Stored path of the image, if any
    pub image: Option<String>,
    /// Resolved URL of the image, falls back to the default asset
    pub image_url: String,
    pub status: bool,
    pub category_id: i64,
    pub category: ProductCategoryDto,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Entry of the category picker on product forms
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CategoryOptionDto {
    pub id: i64,
    pub name: String,
}

/// Values for the create/edit form
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProductFormDto {
    /// Present when editing an existing product
    pub id: Option<i64>,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    #[schema(value_type = Option<String>)]
    pub unit_price: Option<Decimal>,
    #[schema(value_type = Option<String>)]
    pub sale_price: Option<Decimal>,
    pub status: bool,
    pub category_id: Option<i64>,
    pub image_url: Option<String>,
    pub categories: Vec<CategoryOptionDto>,
}

impl ProductFormDto {
    pub fn empty(categories: Vec<CategoryOptionDto>) -> Self {
        Self {
            id: None,
            name: String::new(),
            slug: String::new(),
            description: None,
            unit_price: None,
            sale_price: None,
            status: true,
            category_id: None,
            image_url: None,
            categories,
        }
    }
}
