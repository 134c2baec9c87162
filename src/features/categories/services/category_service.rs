use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};
use std::borrow::Cow;
use std::sync::Arc;
use tracing::{debug, info};

use crate::core::error::{handle_db_error, AppError, Result};
use crate::core::extractor::UploadedImage;
use crate::features::categories::dtos::{
    CategoryDetailDto, CategoryFormDto, CategoryProductDto, CategoryResponseDto, CreateCategoryDto,
    UpdateCategoryDto,
};
use crate::features::categories::models::{
    normalize_before_create, normalize_before_update, Category, CategoryChanges,
};
use crate::modules::storage::{ImageStorage, ImageUrlResolver, StorageArea};
use crate::shared::constants::CATEGORY_IMAGE_DIR;
use crate::shared::images::storage_path;
use crate::shared::types::{Meta, Page, PaginationQuery};

const CATEGORY_COLUMNS: &str =
    "id, name, slug, description, image, status, created_at, updated_at";

/// Product columns needed for the category detail view
#[derive(Debug, FromRow)]
struct CategoryProductRow {
    id: i64,
    name: String,
    slug: String,
    unit_price: Decimal,
    sale_price: Option<Decimal>,
    image: Option<String>,
    status: bool,
}

/// Service for category operations
pub struct CategoryService {
    pool: PgPool,
    storage: Arc<dyn ImageStorage>,
    images: ImageUrlResolver,
}

impl CategoryService {
    pub fn new(pool: PgPool, storage: Arc<dyn ImageStorage>, images: ImageUrlResolver) -> Self {
        Self {
            pool,
            storage,
            images,
        }
    }

    async fn to_response(&self, c: Category) -> CategoryResponseDto {
        let image_url = self.images.resolve(c.image.as_deref()).await;
        CategoryResponseDto {
            id: c.id,
            name: c.name,
            slug: c.slug,
            description: c.description,
            image: c.image,
            image_url,
            status: c.status,
            created_at: c.created_at,
            updated_at: c.updated_at,
        }
    }

    /// List categories, 10 per page, ordered by id
    pub async fn list(&self, page: &PaginationQuery) -> Result<Page<CategoryResponseDto>> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM categories")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to count categories: {:?}", e);
                AppError::Database(e)
            })?;

        let query = format!(
            "SELECT {} FROM categories ORDER BY id LIMIT $1 OFFSET $2",
            CATEGORY_COLUMNS
        );
        let categories: Vec<Category> = sqlx::query_as(&query)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to list categories: {:?}", e);
                AppError::Database(e)
            })?;

        let mut items = Vec::with_capacity(categories.len());
        for category in categories {
            items.push(self.to_response(category).await);
        }

        Ok(Page {
            items,
            meta: Meta::paginated(total, page),
        })
    }

    /// Find a category or fail with `NotFound`
    pub async fn find_or_fail(&self, id: i64) -> Result<Category> {
        let query = format!("SELECT {} FROM categories WHERE id = $1", CATEGORY_COLUMNS);
        sqlx::query_as::<_, Category>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)?
            .ok_or_else(|| AppError::NotFound(format!("Category with id {} not found", id)))
    }

    async fn slug_exists(&self, slug: &str) -> Result<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM categories WHERE slug = $1)")
                .bind(slug)
                .fetch_one(&self.pool)
                .await
                .map_err(AppError::Database)?;
        Ok(exists)
    }

    /// Get a category with its products
    pub async fn show(&self, id: i64) -> Result<CategoryDetailDto> {
        let category = self.find_or_fail(id).await?;

        let rows: Vec<CategoryProductRow> = sqlx::query_as(
            r#"
            SELECT id, name, slug, unit_price, sale_price, image, status
            FROM products
            WHERE category_id = $1
            ORDER BY id
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::Database)?;

        let mut products = Vec::with_capacity(rows.len());
        for row in rows {
            let image_url = self.images.resolve(row.image.as_deref()).await;
            products.push(CategoryProductDto {
                id: row.id,
                name: row.name,
                slug: row.slug,
                unit_price: row.unit_price,
                sale_price: row.sale_price,
                status: row.status,
                image_url,
            });
        }

        Ok(CategoryDetailDto {
            category: self.to_response(category).await,
            products,
        })
    }

    /// Current values for the edit form
    pub async fn edit_form(&self, id: i64) -> Result<CategoryFormDto> {
        let category = self.find_or_fail(id).await?;
        let image_url = match category.image {
            Some(ref image) => Some(self.images.resolve(Some(image.as_str())).await),
            None => None,
        };

        Ok(CategoryFormDto {
            id: Some(category.id),
            name: category.name,
            slug: category.slug,
            description: category.description,
            status: category.status,
            image_url,
        })
    }

    /// Create a category, then store its image if one was uploaded
    ///
    /// The insert and the image write are not atomic: a failed upload leaves
    /// the category without an image.
    pub async fn create(
        &self,
        dto: CreateCategoryDto,
        image: Option<UploadedImage>,
    ) -> Result<CategoryResponseDto> {
        if let Some(ref slug) = dto.slug {
            if self.slug_exists(slug).await? {
                return Err(AppError::field(
                    "slug",
                    "unique",
                    "The slug has already been taken.",
                ));
            }
        }

        let new = normalize_before_create(dto.into_new_category())?;

        let query = format!(
            r#"
            INSERT INTO categories (name, slug, description, image, status)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            CATEGORY_COLUMNS
        );
        let mut category: Category = sqlx::query_as(&query)
            .bind(&new.name)
            .bind(&new.slug)
            .bind(&new.description)
            .bind(&new.image)
            .bind(new.status)
            .fetch_one(&self.pool)
            .await
            .map_err(handle_db_error)?;

        info!(
            "Category created: id={}, slug={}",
            category.id, category.slug
        );

        if let Some(image) = image {
            let path = self.store_image(image).await?;
            category = self
                .apply(
                    category.id,
                    CategoryChanges {
                        image: Some(path),
                        ..Default::default()
                    },
                )
                .await?;
        }

        Ok(self.to_response(category).await)
    }

    /// Update a category; a changed name re-derives the slug
    pub async fn update(
        &self,
        id: i64,
        dto: UpdateCategoryDto,
        image: Option<UploadedImage>,
    ) -> Result<CategoryResponseDto> {
        let existing = self.find_or_fail(id).await?;
        let mut changes = normalize_before_update(&existing, CategoryChanges::from(dto))?;

        if let Some(image) = image {
            changes.image = Some(self.store_image(image).await?);
        }

        let category = self.apply(id, changes).await?;
        info!(
            "Category updated: id={}, slug={}",
            category.id, category.slug
        );

        Ok(self.to_response(category).await)
    }

    /// Delete a category and return the refreshed listing
    ///
    /// Products are not cascaded: the foreign key rejects deleting a category
    /// that still has products, reported as `Conflict`.
    pub async fn delete(
        &self,
        id: i64,
        page: &PaginationQuery,
    ) -> Result<Page<CategoryResponseDto>> {
        let category = self.find_or_fail(id).await?;

        sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(category.id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                let has_products = matches!(
                    &e,
                    sqlx::Error::Database(db_err) if db_err.code() == Some(Cow::Borrowed("23503"))
                );
                if has_products {
                    AppError::Conflict(format!(
                        "Category '{}' still has products and cannot be deleted",
                        category.slug
                    ))
                } else {
                    handle_db_error(e)
                }
            })?;

        info!("Category deleted: id={}, slug={}", category.id, category.slug);

        self.list(page).await
    }

    async fn store_image(&self, image: UploadedImage) -> Result<String> {
        let path = storage_path(CATEGORY_IMAGE_DIR, &image);
        self.storage
            .put(StorageArea::Public, &path, image.data, &image.content_type)
            .await?;
        debug!("Category image stored: {}", path);
        Ok(path)
    }

    async fn apply(&self, id: i64, changes: CategoryChanges) -> Result<Category> {
        let query = format!(
            r#"
            UPDATE categories
            SET name = COALESCE($1, name),
                slug = COALESCE($2, slug),
                description = CASE WHEN $3 THEN $4 ELSE description END,
                image = COALESCE($5, image),
                status = COALESCE($6, status),
                updated_at = NOW()
            WHERE id = $7
            RETURNING {}
            "#,
            CATEGORY_COLUMNS
        );

        sqlx::query_as::<_, Category>(&query)
            .bind(changes.name)
            .bind(changes.slug)
            .bind(changes.description.is_some())
            .bind(changes.description.flatten())
            .bind(changes.image)
            .bind(changes.status)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(handle_db_error)?
            .ok_or_else(|| AppError::NotFound(format!("Category with id {} not found", id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_helpers::{category_service_on, TEST_DEFAULT_IMAGE_URL};

    fn create_dto(name: &str) -> CreateCategoryDto {
        CreateCategoryDto {
            name: name.to_string(),
            slug: None,
            description: None,
            status: None,
        }
    }

    fn update_dto(name: &str, description: Option<Option<&str>>) -> UpdateCategoryDto {
        UpdateCategoryDto {
            name: name.to_string(),
            description: description.map(|d| d.map(str::to_string)),
            status: None,
        }
    }

    async fn insert_product(pool: &PgPool, category_id: i64, slug: &str) {
        sqlx::query(
            "INSERT INTO products (name, slug, unit_price, category_id) VALUES ($1, $2, $3, $4)",
        )
        .bind(slug)
        .bind(slug)
        .bind(Decimal::new(1999, 2))
        .bind(category_id)
        .execute(pool)
        .await
        .unwrap();
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_create_derives_slug_and_rejects_duplicate(pool: PgPool) {
        let service = category_service_on(pool);

        let created = service.create(create_dto("Electronics"), None).await.unwrap();
        assert_eq!(created.slug, "electronics");
        assert!(created.status);
        assert_eq!(created.image_url, TEST_DEFAULT_IMAGE_URL);

        let duplicate = service.create(create_dto("Electronics"), None).await;
        assert!(matches!(duplicate, Err(AppError::Conflict(_))));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_create_with_taken_slug_is_a_field_error(pool: PgPool) {
        let service = category_service_on(pool);
        service.create(create_dto("Electronics"), None).await.unwrap();

        let mut dto = create_dto("Gadgets");
        dto.slug = Some("electronics".to_string());
        match service.create(dto, None).await {
            Err(AppError::InvalidFields(errors)) => {
                assert!(errors.field_errors().contains_key("slug"))
            }
            other => panic!("expected slug field error, got {:?}", other.map(|c| c.slug)),
        }
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_create_rejects_name_with_overlong_slug(pool: PgPool) {
        let service = category_service_on(pool);
        let result = service.create(create_dto(&"Ж".repeat(255)), None).await;
        assert!(matches!(result, Err(AppError::InvalidFields(_))));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_create_stores_image_in_public_area(pool: PgPool) {
        let service = category_service_on(pool);
        let image = UploadedImage {
            file_name: "tv.png".to_string(),
            content_type: "image/png".to_string(),
            data: vec![1, 2, 3],
        };

        let created = service
            .create(create_dto("Electronics"), Some(image))
            .await
            .unwrap();
        let path = created.image.expect("image path");
        assert!(path.starts_with("categories/"));
        assert_eq!(created.image_url, format!("https://cdn.test/public/{}", path));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_list_pages_by_ten(pool: PgPool) {
        let service = category_service_on(pool);
        for i in 1..=11 {
            service
                .create(create_dto(&format!("Category {}", i)), None)
                .await
                .unwrap();
        }

        let first = service.list(&PaginationQuery { page: 1 }).await.unwrap();
        assert_eq!(first.items.len(), 10);
        assert_eq!(first.items[0].slug, "category-1");
        assert_eq!(
            first.meta,
            Meta {
                total: 11,
                page: 1,
                per_page: 10,
                last_page: 2
            }
        );

        let second = service.list(&PaginationQuery { page: 2 }).await.unwrap();
        assert_eq!(second.items.len(), 1);
        assert_eq!(second.items[0].slug, "category-11");

        let far = service
            .list(&PaginationQuery { page: i64::MAX })
            .await
            .unwrap();
        assert!(far.items.is_empty());
        assert_eq!(far.meta.total, 11);
        assert_eq!(far.meta.last_page, 2);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_rename_persists_regenerated_slug(pool: PgPool) {
        let service = category_service_on(pool);
        let created = service.create(create_dto("Electronics"), None).await.unwrap();

        let updated = service
            .update(created.id, update_dto("Home & Garden", None), None)
            .await
            .unwrap();
        assert_eq!(updated.slug, "home-garden");
        assert_eq!(service.find_or_fail(created.id).await.unwrap().slug, "home-garden");

        let unchanged = service
            .update(created.id, update_dto("Home & Garden", None), None)
            .await
            .unwrap();
        assert_eq!(unchanged.slug, "home-garden");
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_blank_description_clears_it(pool: PgPool) {
        let service = category_service_on(pool);
        let mut dto = create_dto("Electronics");
        dto.description = Some("Gadgets and more".to_string());
        let created = service.create(dto, None).await.unwrap();

        let kept = service
            .update(created.id, update_dto("Electronics", None), None)
            .await
            .unwrap();
        assert_eq!(kept.description.as_deref(), Some("Gadgets and more"));

        let cleared = service
            .update(created.id, update_dto("Electronics", Some(None)), None)
            .await
            .unwrap();
        assert_eq!(cleared.description, None);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_update_missing_category_is_not_found(pool: PgPool) {
        let service = category_service_on(pool);
        let result = service.update(42, update_dto("Electronics", None), None).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_delete_category_with_products_conflicts(pool: PgPool) {
        let service = category_service_on(pool.clone());
        let created = service.create(create_dto("Electronics"), None).await.unwrap();
        insert_product(&pool, created.id, "smartphone").await;

        let result = service.delete(created.id, &PaginationQuery::default()).await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
        assert!(service.find_or_fail(created.id).await.is_ok());
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_delete_returns_refreshed_page(pool: PgPool) {
        let service = category_service_on(pool);
        let kept = service.create(create_dto("Books"), None).await.unwrap();
        let doomed = service.create(create_dto("Toys"), None).await.unwrap();

        let page = service
            .delete(doomed.id, &PaginationQuery::default())
            .await
            .unwrap();
        assert_eq!(page.meta.total, 1);
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].id, kept.id);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_show_lists_products(pool: PgPool) {
        let service = category_service_on(pool.clone());
        let created = service.create(create_dto("Electronics"), None).await.unwrap();
        insert_product(&pool, created.id, "smartphone").await;
        insert_product(&pool, created.id, "laptop").await;

        let detail = service.show(created.id).await.unwrap();
        assert_eq!(detail.category.slug, "electronics");
        let slugs: Vec<_> = detail.products.iter().map(|p| p.slug.as_str()).collect();
        assert_eq!(slugs, vec!["smartphone", "laptop"]);
        assert_eq!(detail.products[0].image_url, TEST_DEFAULT_IMAGE_URL);
    }
}
