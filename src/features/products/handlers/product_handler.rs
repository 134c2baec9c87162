use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::core::extractor::CatalogForm;
use crate::features::products::dtos::{
    CreateProductDto, ProductFormDto, ProductFormUpload, ProductResponseDto, UpdateProductDto,
};
use crate::features::products::services::ProductService;
use crate::shared::images::validate_upload;
use crate::shared::types::{ApiResponse, PaginationQuery};

/// List products
///
/// Ten products per page; `meta` carries the pagination details.
#[utoipa::path(
    get,
    path = "/products",
    params(PaginationQuery),
    responses(
        (status = 200, description = "Page of products", body = ApiResponse<Vec<ProductResponseDto>>),
    ),
    tag = "products"
)]
pub async fn list_products(
    State(service): State<Arc<ProductService>>,
    Query(page): Query<PaginationQuery>,
) -> Result<Json<ApiResponse<Vec<ProductResponseDto>>>> {
    let products = service.list(&page).await?;
    Ok(Json(ApiResponse::page(products, None)))
}

/// Defaults for the product creation form, with the category options
#[utoipa::path(
    get,
    path = "/products/create",
    responses(
        (status = 200, description = "Empty product form", body = ApiResponse<ProductFormDto>),
    ),
    tag = "products"
)]
pub async fn create_product_form(
    State(service): State<Arc<ProductService>>,
) -> Result<Json<ApiResponse<ProductFormDto>>> {
    let form = service.create_form().await?;
    Ok(Json(ApiResponse::success(Some(form), None, None)))
}

/// Create a product
///
/// The slug is required and stored as given.
#[utoipa::path(
    post,
    path = "/products",
    request_body(
        content = ProductFormUpload,
        content_type = "multipart/form-data",
        description = "Product fields with an optional image",
    ),
    responses(
        (status = 201, description = "Product created", body = ApiResponse<ProductResponseDto>),
        (status = 400, description = "Validation error or unknown category"),
        (status = 409, description = "Slug already taken")
    ),
    tag = "products"
)]
pub async fn store_product(
    State(service): State<Arc<ProductService>>,
    form: CatalogForm,
) -> Result<(StatusCode, Json<ApiResponse<ProductResponseDto>>)> {
    let new = CreateProductDto::from_form(&form)?.into_new_product()?;
    if let Some(ref image) = form.image {
        validate_upload(image)?;
    }

    let product = service.create(new, form.image).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(product),
            Some("Product created successfully.".to_string()),
            None,
        )),
    ))
}

/// Get a product with its category
#[utoipa::path(
    get,
    path = "/products/{id}",
    params(
        ("id" = i64, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Product found", body = ApiResponse<ProductResponseDto>),
        (status = 404, description = "Product not found")
    ),
    tag = "products"
)]
pub async fn get_product(
    State(service): State<Arc<ProductService>>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<ProductResponseDto>>> {
    let product = service.show(id).await?;
    Ok(Json(ApiResponse::success(Some(product), None, None)))
}

/// Current values for the product edit form
#[utoipa::path(
    get,
    path = "/products/{id}/edit",
    params(
        ("id" = i64, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Product form", body = ApiResponse<ProductFormDto>),
        (status = 404, description = "Product not found")
    ),
    tag = "products"
)]
pub async fn edit_product_form(
    State(service): State<Arc<ProductService>>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<ProductFormDto>>> {
    let form = service.edit_form(id).await?;
    Ok(Json(ApiResponse::success(Some(form), None, None)))
}

/// Update a product
///
/// Omitted fields keep their stored values.
#[utoipa::path(
    put,
    path = "/products/{id}",
    params(
        ("id" = i64, Path, description = "Product ID")
    ),
    request_body(
        content = ProductFormUpload,
        content_type = "multipart/form-data",
        description = "Product fields with an optional replacement image",
    ),
    responses(
        (status = 200, description = "Product updated", body = ApiResponse<ProductResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 404, description = "Product not found"),
        (status = 409, description = "Slug already taken")
    ),
    tag = "products"
)]
pub async fn update_product(
    State(service): State<Arc<ProductService>>,
    Path(id): Path<i64>,
    form: CatalogForm,
) -> Result<Json<ApiResponse<ProductResponseDto>>> {
    let dto = UpdateProductDto::from_form(&form)?;
    dto.validate().map_err(AppError::InvalidFields)?;
    if let Some(ref image) = form.image {
        validate_upload(image)?;
    }

    let product = service.update(id, dto, form.image).await?;
    Ok(Json(ApiResponse::success(
        Some(product),
        Some("Product updated successfully.".to_string()),
        None,
    )))
}

/// Delete a product
///
/// Returns the refreshed page of products.
#[utoipa::path(
    delete,
    path = "/products/{id}",
    params(
        ("id" = i64, Path, description = "Product ID"),
        PaginationQuery
    ),
    responses(
        (status = 200, description = "Product deleted", body = ApiResponse<Vec<ProductResponseDto>>),
        (status = 404, description = "Product not found")
    ),
    tag = "products"
)]
pub async fn delete_product(
    State(service): State<Arc<ProductService>>,
    Path(id): Path<i64>,
    Query(page): Query<PaginationQuery>,
) -> Result<Json<ApiResponse<Vec<ProductResponseDto>>>> {
    let products = service.delete(id, &page).await?;
    Ok(Json(ApiResponse::page(
        products,
        Some("Product deleted successfully.".to_string()),
    )))
}
