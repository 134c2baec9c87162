use std::sync::Arc;

use axum::{routing::get, Router};

use crate::features::products::handlers;
use crate::features::products::services::ProductService;

/// Create routes for the products feature
pub fn routes(service: Arc<ProductService>) -> Router {
    Router::new()
        .route(
            "/products",
            get(handlers::list_products).post(handlers::store_product),
        )
        .route("/products/create", get(handlers::create_product_form))
        .route(
            "/products/{id}",
            get(handlers::get_product)
                .put(handlers::update_product)
                .patch(handlers::update_product)
                .delete(handlers::delete_product),
        )
        .route("/products/{id}/edit", get(handlers::edit_product_form))
        .with_state(service)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_helpers::{product_service, test_server};
    use axum::http::StatusCode;
    use axum_test::multipart::MultipartForm;
    use fake::faker::lorem::en::Word;
    use fake::Fake;
    use serde_json::Value;

    fn server() -> axum_test::TestServer {
        test_server(routes(product_service()))
    }

    fn error_fields(body: &Value) -> Vec<String> {
        body["errors"]
            .as_array()
            .map(|errors| {
                errors
                    .iter()
                    .filter_map(|e| e.as_str())
                    .filter_map(|e| e.split_once(':').map(|(field, _)| field.to_string()))
                    .collect()
            })
            .unwrap_or_default()
    }

    #[tokio::test]
    async fn test_store_reports_every_missing_field() {
        let name: String = Word().fake();
        let form = MultipartForm::new().add_text("name", name);
        let response = server().post("/products").multipart(form).await;
        response.assert_status(StatusCode::BAD_REQUEST);

        let body: Value = response.json();
        assert_eq!(body["success"], false);
        let fields = error_fields(&body);
        assert!(fields.contains(&"slug".to_string()));
        assert!(fields.contains(&"unit_price".to_string()));
        assert!(fields.contains(&"category_id".to_string()));
        assert!(!fields.contains(&"name".to_string()));
    }

    #[tokio::test]
    async fn test_store_rejects_unparsable_price() {
        let form = MultipartForm::new()
            .add_text("name", "Smartphone")
            .add_text("slug", "smartphone")
            .add_text("unit_price", "cheap")
            .add_text("category_id", "1");
        let response = server().post("/products").multipart(form).await;
        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(error_fields(&response.json()), vec!["unit_price".to_string()]);
    }

    #[tokio::test]
    async fn test_store_rejects_negative_sale_price() {
        let form = MultipartForm::new()
            .add_text("name", "Smartphone")
            .add_text("slug", "smartphone")
            .add_text("unit_price", "999.99")
            .add_text("sale_price", "-5")
            .add_text("category_id", "1");
        let response = server().post("/products").multipart(form).await;
        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(error_fields(&response.json()), vec!["sale_price".to_string()]);
    }

    #[tokio::test]
    async fn test_update_rejects_non_numeric_category() {
        let form = MultipartForm::new()
            .add_text("name", "Smartphone")
            .add_text("category_id", "phones");
        let response = server().put("/products/1").multipart(form).await;
        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(error_fields(&response.json()), vec!["category_id".to_string()]);
    }

    #[tokio::test]
    async fn test_update_requires_multipart_body() {
        let response = server()
            .patch("/products/1")
            .json(&serde_json::json!({ "name": "Smartphone" }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_non_numeric_id_is_rejected() {
        let response = server().delete("/products/smartphone").await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }
}
