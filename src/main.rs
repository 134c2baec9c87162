mod core;
mod features;
mod modules;
mod seeders;
mod shared;

use crate::core::config::{Config, StorageDriver};
use crate::core::openapi::{ApiDoc, SwaggerInfoModifier};
use crate::core::{database, middleware};
use crate::features::categories::{routes as categories_routes, CategoryService};
use crate::features::products::{routes as products_routes, ProductService};
use crate::modules::storage::{
    routes as storage_routes, FilesystemStorage, ImageStorage, ImageUrlResolver, MinIOClient,
};
use crate::shared::constants::DEFAULT_IMAGE_PATH;
use axum::extract::DefaultBodyLimit;
use axum::response::Redirect;
use axum::routing::get;
use axum::{middleware::from_fn, Router};
use std::sync::Arc;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::{DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::Modify;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// What the binary was asked to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Serve,
    Seed,
}

impl Command {
    fn from_args(mut args: impl Iterator<Item = String>) -> anyhow::Result<Self> {
        match args.nth(1).as_deref() {
            None | Some("serve") => Ok(Command::Serve),
            Some("seed") => Ok(Command::Seed),
            Some(other) => Err(anyhow::anyhow!(
                "Unknown command '{}', expected 'serve' or 'seed'",
                other
            )),
        }
    }
}

fn main() -> anyhow::Result<()> {
    let command = Command::from_args(std::env::args())?;

    // Build Tokio runtime with configurable worker threads
    let worker_threads = std::env::var("TOKIO_WORKER_THREADS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|p| p.get())
                .unwrap_or(4)
        });

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(worker_threads)
        .max_blocking_threads(worker_threads * 4)
        .enable_all()
        .build()?;

    runtime.block_on(async_main(command, worker_threads))
}

async fn async_main(command: Command, worker_threads: usize) -> anyhow::Result<()> {
    // Load .env file BEFORE initializing logger so RUST_LOG is available
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().map_err(|e| anyhow::anyhow!(e))?;
    tracing::info!(
        "Configuration loaded: tokio_worker_threads={}, storage_driver={:?}, pid={}",
        worker_threads,
        config.storage.driver,
        std::process::id()
    );

    let pool = database::create_pool(&config.database).await?;
    tracing::info!("Database connection pool created");

    tracing::info!("Running database migrations...");
    database::run_migrations(&pool)
        .await
        .map_err(|e| anyhow::anyhow!("Migration failed: {}", e))?;
    tracing::info!("Database migrations completed successfully");

    if command == Command::Seed {
        let summary = seeders::seed_catalog(&pool).await?;
        tracing::info!(
            "Seeding finished: {} categories, {} products inserted",
            summary.categories,
            summary.products
        );
        return Ok(());
    }

    // Storage backend; the filesystem driver also serves its public area
    let (storage, public_files): (Arc<dyn ImageStorage>, Option<Router>) =
        match config.storage.driver {
            StorageDriver::Filesystem => {
                let fs = Arc::new(FilesystemStorage::new(config.storage.filesystem.clone()));
                fs.ensure_roots()
                    .await
                    .map_err(|e| anyhow::anyhow!("Failed to prepare storage roots: {}", e))?;
                tracing::info!(
                    "Filesystem storage initialized at {}",
                    config.storage.filesystem.public_root.display()
                );
                let files = storage_routes::routes(Arc::clone(&fs));
                let storage: Arc<dyn ImageStorage> = fs;
                (storage, Some(files))
            }
            StorageDriver::MinIO => {
                let minio = MinIOClient::new(config.storage.minio.clone())
                    .await
                    .map_err(|e| anyhow::anyhow!("Failed to initialize MinIO client: {}", e))?;
                tracing::info!("MinIO storage initialized for bucket: {}", minio.bucket_name());
                let storage: Arc<dyn ImageStorage> = Arc::new(minio);
                (storage, None)
            }
        };

    let images = ImageUrlResolver::new(
        Arc::clone(&storage),
        format!("{}/{}", config.app.app_url, DEFAULT_IMAGE_PATH),
    );

    let category_service = Arc::new(CategoryService::new(
        pool.clone(),
        Arc::clone(&storage),
        images.clone(),
    ));
    let product_service = Arc::new(ProductService::new(
        pool.clone(),
        Arc::clone(&storage),
        images,
    ));
    tracing::info!("Catalog services initialized");

    // Build application router with dynamic swagger config
    let swagger_modifier = SwaggerInfoModifier {
        title: config.swagger.title.clone(),
        version: config.swagger.version.clone(),
        description: config.swagger.description.clone(),
    };

    let mut openapi = ApiDoc::openapi();
    swagger_modifier.modify(&mut openapi);

    let swagger = if let Some(credentials) = config.swagger.credentials() {
        tracing::info!("Swagger UI basic auth enabled");
        Router::new()
            .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi))
            .layer(from_fn(middleware::basic_auth_middleware(Arc::new(
                credentials,
            ))))
    } else {
        tracing::info!("Swagger UI basic auth disabled (no credentials configured)");
        Router::new().merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi))
    };

    let mut app = catalog_router(category_service, product_service).merge(swagger);
    if let Some(files) = public_files {
        app = app.merge(files);
    }

    let app = app
        .layer(DefaultBodyLimit::max(config.app.max_request_body_size))
        .layer(middleware::cors_layer(
            config.app.cors_allowed_origins.clone(),
        ))
        // Propagate X-Request-Id to response headers
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(middleware::MakeSpanWithRequestId)
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        // Generate X-Request-Id using UUID v7 (or use client-provided one)
        .layer(SetRequestIdLayer::x_request_id(middleware::MakeRequestUuid));

    // Start server
    let addr = config.app.server_address();
    let socket_addr: std::net::SocketAddr = addr
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid address: {}", e))?;

    // Use socket2 for TCP listener configuration
    let socket = socket2::Socket::new(
        socket2::Domain::for_address(socket_addr),
        socket2::Type::STREAM,
        Some(socket2::Protocol::TCP),
    )?;

    socket.set_reuse_address(true)?;
    socket.set_nodelay(true)?;

    let keepalive = socket2::TcpKeepalive::new().with_time(std::time::Duration::from_secs(60));
    socket.set_tcp_keepalive(&keepalive)?;

    socket.set_nonblocking(true)?;
    socket.bind(&socket_addr.into())?;
    socket.listen(1024)?;

    let listener = tokio::net::TcpListener::from_std(socket.into())?;
    tracing::info!("Server listening on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui/", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

async fn health_check() -> axum::http::StatusCode {
    axum::http::StatusCode::OK
}

/// Catalog routes plus the landing redirect and health check
fn catalog_router(categories: Arc<CategoryService>, products: Arc<ProductService>) -> Router {
    Router::new()
        .route("/", get(|| async { Redirect::to("/products") }))
        .route("/health", get(health_check))
        .merge(categories_routes(categories))
        .merge(products_routes(products))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_helpers::{category_service, product_service, test_server};
    use axum::http::StatusCode;

    fn args(list: &[&str]) -> impl Iterator<Item = String> {
        list.iter()
            .map(|s| s.to_string())
            .collect::<Vec<_>>()
            .into_iter()
    }

    #[test]
    fn test_command_from_args() {
        assert_eq!(
            Command::from_args(args(&["catalog-admin"])).unwrap(),
            Command::Serve
        );
        assert_eq!(
            Command::from_args(args(&["catalog-admin", "seed"])).unwrap(),
            Command::Seed
        );
        assert!(Command::from_args(args(&["catalog-admin", "migrate"])).is_err());
    }

    #[tokio::test]
    async fn test_root_redirects_to_products() {
        let server = test_server(catalog_router(category_service(), product_service()));
        let response = server.get("/").await;
        response.assert_status(StatusCode::SEE_OTHER);
        assert_eq!(response.header("location"), "/products");
    }

    #[tokio::test]
    async fn test_health_check() {
        let server = test_server(catalog_router(category_service(), product_service()));
        server.get("/health").await.assert_status_ok();
    }
}
