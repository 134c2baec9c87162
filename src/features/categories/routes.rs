use std::sync::Arc;

use axum::{routing::get, Router};

use crate::features::categories::handlers;
use crate::features::categories::services::CategoryService;

/// Create routes for the categories feature
pub fn routes(service: Arc<CategoryService>) -> Router {
    Router::new()
        .route(
            "/categories",
            get(handlers::list_categories).post(handlers::store_category),
        )
        .route("/categories/create", get(handlers::create_category_form))
        .route(
            "/categories/{id}",
            get(handlers::get_category)
                .put(handlers::update_category)
                .patch(handlers::update_category)
                .delete(handlers::delete_category),
        )
        .route("/categories/{id}/edit", get(handlers::edit_category_form))
        .with_state(service)
}
