use utoipa::{Modify, OpenApi};

use crate::features::categories::{dtos as categories_dtos, handlers as categories_handlers};
use crate::features::products::{dtos as products_dtos, handlers as products_handlers};
use crate::modules::storage::routes as storage_routes;
use crate::shared::types::{ApiResponse, Meta};

#[derive(OpenApi)]
#[openapi(
    paths(
        // Categories
        categories_handlers::list_categories,
        categories_handlers::create_category_form,
        categories_handlers::store_category,
        categories_handlers::get_category,
        categories_handlers::edit_category_form,
        categories_handlers::update_category,
        categories_handlers::delete_category,
        // Products
        products_handlers::list_products,
        products_handlers::create_product_form,
        products_handlers::store_product,
        products_handlers::get_product,
        products_handlers::edit_product_form,
        products_handlers::update_product,
        products_handlers::delete_product,
        // Storage
        storage_routes::serve_public_file,
    ),
    components(
        schemas(
            // Shared
            Meta,
            // Categories
            categories_dtos::CategoryFormUpload,
            categories_dtos::CategoryResponseDto,
            categories_dtos::CategoryProductDto,
            categories_dtos::CategoryDetailDto,
            categories_dtos::CategoryFormDto,
            ApiResponse<Vec<categories_dtos::CategoryResponseDto>>,
            ApiResponse<categories_dtos::CategoryResponseDto>,
            ApiResponse<categories_dtos::CategoryDetailDto>,
            ApiResponse<categories_dtos::CategoryFormDto>,
            // Products
            products_dtos::ProductFormUpload,
            products_dtos::ProductCategoryDto,
            products_dtos::ProductResponseDto,
            products_dtos::CategoryOptionDto,
            products_dtos::ProductFormDto,
            ApiResponse<Vec<products_dtos::ProductResponseDto>>,
            ApiResponse<products_dtos::ProductResponseDto>,
            ApiResponse<products_dtos::ProductFormDto>,
        )
    ),
    tags(
        (name = "categories", description = "Catalog categories"),
        (name = "products", description = "Catalog products"),
        (name = "storage", description = "Publicly served catalog images"),
    ),
    info(
        title = "Catalog Admin API",
        version = "0.1.0",
        description = "API documentation for the catalog admin",
    )
)]
pub struct ApiDoc;

/// Overrides the document info with values from configuration
pub struct SwaggerInfoModifier {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Modify for SwaggerInfoModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = self.title.clone();
        openapi.info.version = self.version.clone();
        openapi.info.description = Some(self.description.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_lists_catalog_paths() {
        let doc = ApiDoc::openapi();
        for path in [
            "/categories",
            "/categories/create",
            "/categories/{id}",
            "/categories/{id}/edit",
            "/products",
            "/products/create",
            "/products/{id}",
            "/products/{id}/edit",
            "/storage/{path}",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {}", path);
        }
    }

    #[test]
    fn test_info_modifier_overrides_title() {
        let mut doc = ApiDoc::openapi();
        SwaggerInfoModifier {
            title: "Shop Admin".to_string(),
            version: "2.0.0".to_string(),
            description: "Internal".to_string(),
        }
        .modify(&mut doc);
        assert_eq!(doc.info.title, "Shop Admin");
        assert_eq!(doc.info.version, "2.0.0");
        assert_eq!(doc.info.description.as_deref(), Some("Internal"));
    }
}
