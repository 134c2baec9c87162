use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::{debug, info};

use crate::shared::constants::DEFAULT_IMAGE_PATH;
use crate::shared::slug::slugify;

const CATEGORY_NAMES: [&str; 6] = [
    "Electronics",
    "Clothing & Fashion",
    "Home & Garden",
    "Sports & Outdoors",
    "Books & Media",
    "Health & Beauty",
];

struct SeedProduct {
    name: &'static str,
    slug: &'static str,
    description: &'static str,
    /// Prices in cents
    unit_price: i64,
    sale_price: i64,
    /// Owning category, by position in `CATEGORY_NAMES`
    category: usize,
}

const PRODUCTS: [SeedProduct; 6] = [
    SeedProduct {
        name: "Smartphone",
        slug: "smartphone",
        description: "A high-end smartphone.",
        unit_price: 99999,
        sale_price: 89999,
        category: 0,
    },
    SeedProduct {
        name: "T-Shirt",
        slug: "t-shirt",
        description: "A comfortable cotton t-shirt.",
        unit_price: 1999,
        sale_price: 1499,
        category: 1,
    },
    SeedProduct {
        name: "Garden Chair",
        slug: "garden-chair",
        description: "A stylish garden chair.",
        unit_price: 4999,
        sale_price: 3999,
        category: 2,
    },
    SeedProduct {
        name: "Running Shoes",
        slug: "running-shoes",
        description: "Lightweight running shoes.",
        unit_price: 7999,
        sale_price: 6999,
        category: 3,
    },
    SeedProduct {
        name: "Cooking Book",
        slug: "cooking-book",
        description: "A book with delicious recipes.",
        unit_price: 2999,
        sale_price: 2499,
        category: 4,
    },
    SeedProduct {
        name: "Face Cream",
        slug: "face-cream",
        description: "A moisturizing face cream.",
        unit_price: 3999,
        sale_price: 3499,
        category: 5,
    },
];

/// Rows actually inserted; existing slugs are skipped
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub categories: u64,
    pub products: u64,
}

/// Insert the demo categories and one product per category
///
/// Idempotent: rows whose slug already exists are left untouched.
pub async fn seed_catalog(pool: &PgPool) -> Result<SeedSummary, sqlx::Error> {
    let mut tx = pool.begin().await?;
    let mut summary = SeedSummary::default();

    for name in CATEGORY_NAMES {
        let result = sqlx::query(
            r#"
            INSERT INTO categories (name, slug, description, image, status)
            VALUES ($1, $2, $3, $4, TRUE)
            ON CONFLICT (slug) DO NOTHING
            "#,
        )
        .bind(name)
        .bind(slugify(name))
        .bind(format!("Description for {}", name))
        .bind(DEFAULT_IMAGE_PATH)
        .execute(&mut *tx)
        .await?;
        summary.categories += result.rows_affected();
    }

    for product in &PRODUCTS {
        let category_slug = slugify(CATEGORY_NAMES[product.category]);
        let result = sqlx::query(
            r#"
            INSERT INTO products
                (name, slug, description, unit_price, sale_price, image, status, category_id)
            SELECT $1, $2, $3, $4, $5, $6, TRUE, c.id
            FROM categories c
            WHERE c.slug = $7
            ON CONFLICT (slug) DO NOTHING
            "#,
        )
        .bind(product.name)
        .bind(product.slug)
        .bind(product.description)
        .bind(Decimal::new(product.unit_price, 2))
        .bind(Decimal::new(product.sale_price, 2))
        .bind(DEFAULT_IMAGE_PATH)
        .bind(&category_slug)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            debug!("Skipped product '{}' (already seeded)", product.slug);
        }
        summary.products += result.rows_affected();
    }

    tx.commit().await?;

    info!(
        "Seeded {} categories and {} products",
        summary.categories, summary.products
    );
    Ok(summary)
}
