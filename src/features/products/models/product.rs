use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;

/// Database model for product
#[derive(Debug, Clone, FromRow)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub unit_price: Decimal,
    pub sale_price: Option<Decimal>,
    pub image: Option<String>,
    pub status: bool,
    pub category_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Product joined with the name and slug of its category
#[derive(Debug, Clone, FromRow)]
pub struct ProductWithCategory {
    #[sqlx(flatten)]
    pub product: Product,
    pub category_name: String,
    pub category_slug: String,
}

/// Values for a product insert; the slug is always caller-supplied
#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub unit_price: Decimal,
    pub sale_price: Option<Decimal>,
    pub image: Option<String>,
    pub status: bool,
    pub category_id: i64,
}

/// Partial overwrite of a stored product; `None` leaves the column as is
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductChanges {
    pub name: Option<String>,
    pub slug: Option<String>,
    /// `Some(None)` clears the description
    pub description: Option<Option<String>>,
    pub unit_price: Option<Decimal>,
    /// `Some(None)` takes the product off sale
    pub sale_price: Option<Option<Decimal>>,
    pub image: Option<String>,
    pub status: Option<bool>,
    pub category_id: Option<i64>,
}

impl Product {
    /// Price a customer pays: the sale price when set, otherwise the unit price
    pub fn effective_price(&self) -> Decimal {
        self.sale_price.unwrap_or(self.unit_price)
    }

    pub fn is_on_sale(&self) -> bool {
        matches!(self.sale_price, Some(sale) if sale < self.unit_price)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(unit: Decimal, sale: Option<Decimal>) -> Product {
        Product {
            id: 1,
            name: "Smartphone".to_string(),
            slug: "smartphone".to_string(),
            description: None,
            unit_price: unit,
            sale_price: sale,
            image: None,
            status: true,
            category_id: 1,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_effective_price_prefers_sale_price() {
        let p = product(Decimal::new(99999, 2), Some(Decimal::new(89999, 2)));
        assert_eq!(p.effective_price(), Decimal::new(89999, 2));
        assert!(p.is_on_sale());
    }

    #[test]
    fn test_effective_price_without_sale() {
        let p = product(Decimal::new(1999, 2), None);
        assert_eq!(p.effective_price(), Decimal::new(1999, 2));
        assert!(!p.is_on_sale());
    }

    #[test]
    fn test_sale_price_above_unit_price_is_not_a_sale() {
        let p = product(Decimal::new(1999, 2), Some(Decimal::new(2999, 2)));
        assert!(!p.is_on_sale());
    }
}
