use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::core::extractor::CatalogForm;
use crate::features::categories::dtos::{
    CategoryDetailDto, CategoryFormDto, CategoryFormUpload, CategoryResponseDto,
    CreateCategoryDto, UpdateCategoryDto,
};
use crate::features::categories::services::CategoryService;
use crate::shared::images::validate_upload;
use crate::shared::types::{ApiResponse, PaginationQuery};

/// List categories
///
/// Ten categories per page; `meta` carries the pagination details.
#[utoipa::path(
    get,
    path = "/categories",
    params(PaginationQuery),
    responses(
        (status = 200, description = "Page of categories", body = ApiResponse<Vec<CategoryResponseDto>>),
    ),
    tag = "categories"
)]
pub async fn list_categories(
    State(service): State<Arc<CategoryService>>,
    Query(page): Query<PaginationQuery>,
) -> Result<Json<ApiResponse<Vec<CategoryResponseDto>>>> {
    let categories = service.list(&page).await?;
    Ok(Json(ApiResponse::page(categories, None)))
}

/// Defaults for the category creation form
#[utoipa::path(
    get,
    path = "/categories/create",
    responses(
        (status = 200, description = "Empty category form", body = ApiResponse<CategoryFormDto>),
    ),
    tag = "categories"
)]
pub async fn create_category_form() -> Json<ApiResponse<CategoryFormDto>> {
    Json(ApiResponse::success(
        Some(CategoryFormDto::default()),
        None,
        None,
    ))
}

/// Create a category
///
/// The slug is derived from the name when omitted.
#[utoipa::path(
    post,
    path = "/categories",
    request_body(
        content = CategoryFormUpload,
        content_type = "multipart/form-data",
        description = "Category fields with an optional image",
    ),
    responses(
        (status = 201, description = "Category created", body = ApiResponse<CategoryResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 409, description = "Slug already taken")
    ),
    tag = "categories"
)]
pub async fn store_category(
    State(service): State<Arc<CategoryService>>,
    form: CatalogForm,
) -> Result<(StatusCode, Json<ApiResponse<CategoryResponseDto>>)> {
    let dto = CreateCategoryDto::from_form(&form)?;
    dto.validate().map_err(AppError::InvalidFields)?;
    if let Some(ref image) = form.image {
        validate_upload(image)?;
    }

    let category = service.create(dto, form.image).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(category),
            Some("Category created successfully.".to_string()),
            None,
        )),
    ))
}

/// Get a category with its products
#[utoipa::path(
    get,
    path = "/categories/{id}",
    params(
        ("id" = i64, Path, description = "Category ID")
    ),
    responses(
        (status = 200, description = "Category found", body = ApiResponse<CategoryDetailDto>),
        (status = 404, description = "Category not found")
    ),
    tag = "categories"
)]
pub async fn get_category(
    State(service): State<Arc<CategoryService>>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<CategoryDetailDto>>> {
    let category = service.show(id).await?;
    Ok(Json(ApiResponse::success(Some(category), None, None)))
}

/// Current values for the category edit form
#[utoipa::path(
    get,
    path = "/categories/{id}/edit",
    params(
        ("id" = i64, Path, description = "Category ID")
    ),
    responses(
        (status = 200, description = "Category form", body = ApiResponse<CategoryFormDto>),
        (status = 404, description = "Category not found")
    ),
    tag = "categories"
)]
pub async fn edit_category_form(
    State(service): State<Arc<CategoryService>>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<CategoryFormDto>>> {
    let form = service.edit_form(id).await?;
    Ok(Json(ApiResponse::success(Some(form), None, None)))
}

/// Update a category
///
/// Changing the name regenerates the slug.
#[utoipa::path(
    put,
    path = "/categories/{id}",
    params(
        ("id" = i64, Path, description = "Category ID")
    ),
    request_body(
        content = CategoryFormUpload,
        content_type = "multipart/form-data",
        description = "Category fields with an optional replacement image",
    ),
    responses(
        (status = 200, description = "Category updated", body = ApiResponse<CategoryResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 404, description = "Category not found"),
        (status = 409, description = "Slug already taken")
    ),
    tag = "categories"
)]
pub async fn update_category(
    State(service): State<Arc<CategoryService>>,
    Path(id): Path<i64>,
    form: CatalogForm,
) -> Result<Json<ApiResponse<CategoryResponseDto>>> {
    let dto = UpdateCategoryDto::from_form(&form)?;
    dto.validate().map_err(AppError::InvalidFields)?;
    if let Some(ref image) = form.image {
        validate_upload(image)?;
    }

    let category = service.update(id, dto, form.image).await?;
    Ok(Json(ApiResponse::success(
        Some(category),
        Some("Category updated successfully.".to_string()),
        None,
    )))
}

/// Delete a category
///
/// Returns the refreshed page of categories.
#[utoipa::path(
    delete,
    path = "/categories/{id}",
    params(
        ("id" = i64, Path, description = "Category ID"),
        PaginationQuery
    ),
    responses(
        (status = 200, description = "Category deleted", body = ApiResponse<Vec<CategoryResponseDto>>),
        (status = 404, description = "Category not found"),
        (status = 409, description = "Category still has products")
    ),
    tag = "categories"
)]
pub async fn delete_category(
    State(service): State<Arc<CategoryService>>,
    Path(id): Path<i64>,
    Query(page): Query<PaginationQuery>,
) -> Result<Json<ApiResponse<Vec<CategoryResponseDto>>>> {
    let categories = service.delete(id, &page).await?;
    Ok(Json(ApiResponse::page(
        categories,
        Some("Category deleted successfully.".to_string()),
    )))
}
