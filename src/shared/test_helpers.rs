use std::sync::Arc;

use axum::Router;
use axum_test::TestServer;
use sqlx::PgPool;

use crate::core::database::lazy_pool;
use crate::features::categories::CategoryService;
use crate::features::products::ProductService;
use crate::modules::storage::testing::MemoryStorage;
use crate::modules::storage::{ImageStorage, ImageUrlResolver};

pub const TEST_DEFAULT_IMAGE_URL: &str = "http://localhost:8000/images/default.png";

pub fn memory_storage() -> Arc<dyn ImageStorage> {
    Arc::new(MemoryStorage::default())
}

pub fn test_resolver(storage: Arc<dyn ImageStorage>) -> ImageUrlResolver {
    ImageUrlResolver::new(storage, TEST_DEFAULT_IMAGE_URL)
}

/// Category service over a pool that is never reached by the calling test
pub fn category_service() -> Arc<CategoryService> {
    let storage = memory_storage();
    Arc::new(CategoryService::new(
        lazy_pool(),
        storage.clone(),
        test_resolver(storage),
    ))
}

/// Product service over a pool that is never reached by the calling test
pub fn product_service() -> Arc<ProductService> {
    let storage = memory_storage();
    Arc::new(ProductService::new(
        lazy_pool(),
        storage.clone(),
        test_resolver(storage),
    ))
}

/// Category service over a migrated test database
pub fn category_service_on(pool: PgPool) -> CategoryService {
    let storage = memory_storage();
    CategoryService::new(pool, storage.clone(), test_resolver(storage))
}

/// Product service over a migrated test database
pub fn product_service_on(pool: PgPool) -> ProductService {
    let storage = memory_storage();
    ProductService::new(pool, storage.clone(), test_resolver(storage))
}

/// Insert a bare category row and return its id
pub async fn insert_category(pool: &PgPool, name: &str, slug: &str) -> i64 {
    sqlx::query_scalar("INSERT INTO categories (name, slug) VALUES ($1, $2) RETURNING id")
        .bind(name)
        .bind(slug)
        .fetch_one(pool)
        .await
        .expect("insert category")
}

pub fn test_server(router: Router) -> TestServer {
    TestServer::new(router).expect("test server")
}
