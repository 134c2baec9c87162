use sqlx::PgPool;
use std::sync::Arc;
use tracing::{debug, info};

use crate::core::error::{handle_db_error, AppError, Result};
use crate::core::extractor::UploadedImage;
use crate::features::products::dtos::{
    CategoryOptionDto, ProductCategoryDto, ProductFormDto, ProductResponseDto, UpdateProductDto,
};
use crate::features::products::models::{NewProduct, Product, ProductChanges, ProductWithCategory};
use crate::modules::storage::{ImageStorage, ImageUrlResolver, StorageArea};
use crate::shared::constants::PRODUCT_IMAGE_DIR;
use crate::shared::images::storage_path;
use crate::shared::types::{Meta, Page, PaginationQuery};

const PRODUCT_COLUMNS: &str = "id, name, slug, description, unit_price, sale_price, image, \
     status, category_id, created_at, updated_at";

const PRODUCT_WITH_CATEGORY_SELECT: &str = r#"
    SELECT p.id, p.name, p.slug, p.description, p.unit_price, p.sale_price, p.image,
           p.status, p.category_id, p.created_at, p.updated_at,
           c.name AS category_name, c.slug AS category_slug
    FROM products p
    JOIN categories c ON c.id = p.category_id
"#;

/// Service for product operations
pub struct ProductService {
    pool: PgPool,
    storage: Arc<dyn ImageStorage>,
    images: ImageUrlResolver,
}

impl ProductService {
    pub fn new(pool: PgPool, storage: Arc<dyn ImageStorage>, images: ImageUrlResolver) -> Self {
        Self {
            pool,
            storage,
            images,
        }
    }

    async fn to_response(&self, row: ProductWithCategory) -> ProductResponseDto {
        let p = row.product;
        let image_url = self.images.resolve(p.image.as_deref()).await;
        let effective_price = p.effective_price();
        let on_sale = p.is_on_sale();

        ProductResponseDto {
            id: p.id,
            name: p.name,
            slug: p.slug,
            description: p.description,
            unit_price: p.unit_price,
            sale_price: p.sale_price,
            effective_price,
            on_sale,
            image: p.image,
            image_url,
            status: p.status,
            category_id: p.category_id,
            category: ProductCategoryDto {
                id: p.category_id,
                name: row.category_name,
                slug: row.category_slug,
            },
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }

    /// List products with their category, 10 per page, ordered by id
    pub async fn list(&self, page: &PaginationQuery) -> Result<Page<ProductResponseDto>> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to count products: {:?}", e);
                AppError::Database(e)
            })?;

        let query = format!(
            "{} ORDER BY p.id LIMIT $1 OFFSET $2",
            PRODUCT_WITH_CATEGORY_SELECT
        );
        let rows: Vec<ProductWithCategory> = sqlx::query_as(&query)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to list products: {:?}", e);
                AppError::Database(e)
            })?;

        let mut items = Vec::with_capacity(rows.len());
        for row in rows {
            items.push(self.to_response(row).await);
        }

        Ok(Page {
            items,
            meta: Meta::paginated(total, page),
        })
    }

    async fn find_with_category(&self, id: i64) -> Result<ProductWithCategory> {
        let query = format!("{} WHERE p.id = $1", PRODUCT_WITH_CATEGORY_SELECT);
        sqlx::query_as::<_, ProductWithCategory>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)?
            .ok_or_else(|| AppError::NotFound(format!("Product with id {} not found", id)))
    }

    /// Find a product or fail with `NotFound`
    pub async fn find_or_fail(&self, id: i64) -> Result<Product> {
        let query = format!("SELECT {} FROM products WHERE id = $1", PRODUCT_COLUMNS);
        sqlx::query_as::<_, Product>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)?
            .ok_or_else(|| AppError::NotFound(format!("Product with id {} not found", id)))
    }

    /// Get a product with its category summary
    pub async fn show(&self, id: i64) -> Result<ProductResponseDto> {
        let row = self.find_with_category(id).await?;
        Ok(self.to_response(row).await)
    }

    async fn category_options(&self) -> Result<Vec<CategoryOptionDto>> {
        let rows: Vec<(i64, String)> =
            sqlx::query_as("SELECT id, name FROM categories ORDER BY name, id")
                .fetch_all(&self.pool)
                .await
                .map_err(AppError::Database)?;

        Ok(rows
            .into_iter()
            .map(|(id, name)| CategoryOptionDto { id, name })
            .collect())
    }

    /// Empty form with the category options
    pub async fn create_form(&self) -> Result<ProductFormDto> {
        Ok(ProductFormDto::empty(self.category_options().await?))
    }

    /// Current values for the edit form, with the category options
    pub async fn edit_form(&self, id: i64) -> Result<ProductFormDto> {
        let product = self.find_or_fail(id).await?;
        let image_url = match product.image {
            Some(ref image) => Some(self.images.resolve(Some(image.as_str())).await),
            None => None,
        };

        Ok(ProductFormDto {
            id: Some(product.id),
            name: product.name,
            slug: product.slug,
            description: product.description,
            unit_price: Some(product.unit_price),
            sale_price: product.sale_price,
            status: product.status,
            category_id: Some(product.category_id),
            image_url,
            categories: self.category_options().await?,
        })
    }

    async fn ensure_category_exists(&self, category_id: i64) -> Result<()> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM categories WHERE id = $1)")
            .bind(category_id)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)?;

        if !exists {
            return Err(AppError::field(
                "category_id",
                "exists",
                "The selected category id is invalid.",
            ));
        }
        Ok(())
    }

    /// Create a product, then store its image if one was uploaded
    pub async fn create(
        &self,
        new: NewProduct,
        image: Option<UploadedImage>,
    ) -> Result<ProductResponseDto> {
        self.ensure_category_exists(new.category_id).await?;

        let query = format!(
            r#"
            INSERT INTO products
                (name, slug, description, unit_price, sale_price, image, status, category_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {}
            "#,
            PRODUCT_COLUMNS
        );
        let mut product: Product = sqlx::query_as(&query)
            .bind(&new.name)
            .bind(&new.slug)
            .bind(&new.description)
            .bind(new.unit_price)
            .bind(new.sale_price)
            .bind(&new.image)
            .bind(new.status)
            .bind(new.category_id)
            .fetch_one(&self.pool)
            .await
            .map_err(handle_db_error)?;

        info!("Product created: id={}, slug={}", product.id, product.slug);

        if let Some(image) = image {
            let path = self.store_image(image).await?;
            product = self
                .apply(
                    product.id,
                    ProductChanges {
                        image: Some(path),
                        ..Default::default()
                    },
                )
                .await?;
        }

        self.show(product.id).await
    }

    /// Overwrite the supplied fields of a product
    pub async fn update(
        &self,
        id: i64,
        dto: UpdateProductDto,
        image: Option<UploadedImage>,
    ) -> Result<ProductResponseDto> {
        self.find_or_fail(id).await?;

        let mut changes = ProductChanges::from(dto);
        if let Some(category_id) = changes.category_id {
            self.ensure_category_exists(category_id).await?;
        }
        if let Some(image) = image {
            changes.image = Some(self.store_image(image).await?);
        }

        let product = self.apply(id, changes).await?;
        info!("Product updated: id={}, slug={}", product.id, product.slug);

        self.show(product.id).await
    }

    /// Delete a product and return the refreshed listing
    pub async fn delete(&self, id: i64, page: &PaginationQuery) -> Result<Page<ProductResponseDto>> {
        let product = self.find_or_fail(id).await?;

        sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(product.id)
            .execute(&self.pool)
            .await
            .map_err(handle_db_error)?;

        info!("Product deleted: id={}, slug={}", product.id, product.slug);

        self.list(page).await
    }

    async fn store_image(&self, image: UploadedImage) -> Result<String> {
        let path = storage_path(PRODUCT_IMAGE_DIR, &image);
        self.storage
            .put(StorageArea::Public, &path, image.data, &image.content_type)
            .await?;
        debug!("Product image stored: {}", path);
        Ok(path)
    }

    async fn apply(&self, id: i64, changes: ProductChanges) -> Result<Product> {
        let query = format!(
            r#"
            UPDATE products
            SET name = COALESCE($1, name),
                slug = COALESCE($2, slug),
                description = CASE WHEN $3 THEN $4 ELSE description END,
                unit_price = COALESCE($5, unit_price),
                sale_price = CASE WHEN $6 THEN $7 ELSE sale_price END,
                image = COALESCE($8, image),
                status = COALESCE($9, status),
                category_id = COALESCE($10, category_id),
                updated_at = NOW()
            WHERE id = $11
            RETURNING {}
            "#,
            PRODUCT_COLUMNS
        );

        sqlx::query_as::<_, Product>(&query)
            .bind(changes.name)
            .bind(changes.slug)
            .bind(changes.description.is_some())
            .bind(changes.description.flatten())
            .bind(changes.unit_price)
            .bind(changes.sale_price.is_some())
            .bind(changes.sale_price.flatten())
            .bind(changes.image)
            .bind(changes.status)
            .bind(changes.category_id)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(handle_db_error)?
            .ok_or_else(|| AppError::NotFound(format!("Product with id {} not found", id)))
    }
}
