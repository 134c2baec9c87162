/// Items per page on every catalog listing
pub const CATALOG_PAGE_SIZE: i64 = 10;

/// Asset served when an entity has no image, relative to `APP_URL`
pub const DEFAULT_IMAGE_PATH: &str = "images/default.png";

/// Storage directory for uploaded category images
pub const CATEGORY_IMAGE_DIR: &str = "categories";

/// Storage directory for uploaded product images
pub const PRODUCT_IMAGE_DIR: &str = "products";
