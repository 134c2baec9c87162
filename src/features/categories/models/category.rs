use chrono::{DateTime, Utc};
use sqlx::FromRow;

use crate::core::error::{AppError, Result};
use crate::shared::slug::slugify;

/// Database model for category
#[derive(Debug, Clone, FromRow)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub image: Option<String>,
    pub status: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Values for a category insert
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCategory {
    pub name: String,
    /// Derived from `name` when absent or blank
    pub slug: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub status: bool,
}

/// Partial overwrite of a stored category; `None` leaves the column as is
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryChanges {
    pub name: Option<String>,
    pub slug: Option<String>,
    /// `Some(None)` clears the description
    pub description: Option<Option<String>>,
    pub image: Option<String>,
    pub status: Option<bool>,
}

/// Width of the `slug` column
pub const SLUG_MAX_LENGTH: usize = 255;

fn derived_slug(name: &str) -> Result<String> {
    let slug = slugify(name);
    if slug.is_empty() {
        return Err(AppError::field(
            "name",
            "slug",
            "The name must contain at least one letter or digit.",
        ));
    }
    // Transliteration can make the slug longer than the name
    if slug.len() > SLUG_MAX_LENGTH {
        return Err(AppError::field(
            "name",
            "slug",
            format!(
                "The slug derived from the name may not be greater than {} characters.",
                SLUG_MAX_LENGTH
            ),
        ));
    }
    Ok(slug)
}

/// Fill in the slug before insert
///
/// A caller-supplied, non-blank slug is kept; otherwise it is derived from
/// `name`. Fails when no usable slug can be derived.
pub fn normalize_before_create(mut category: NewCategory) -> Result<NewCategory> {
    let supplied = category
        .slug
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    category.slug = Some(match supplied {
        Some(slug) => slug,
        None => derived_slug(&category.name)?,
    });
    Ok(category)
}

/// Re-derive the slug when the name changes
///
/// Any slug already stored is overwritten, including hand-picked ones.
/// Changes that keep the name leave the stored slug alone.
pub fn normalize_before_update(
    existing: &Category,
    mut changes: CategoryChanges,
) -> Result<CategoryChanges> {
    match changes.name.as_deref() {
        Some(name) if name != existing.name => {
            changes.slug = Some(derived_slug(name)?);
        }
        _ => changes.slug = None,
    }
    Ok(changes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fake::faker::company::en::CompanyName;
    use fake::Fake;

    fn new_category(name: &str, slug: Option<&str>) -> NewCategory {
        NewCategory {
            name: name.to_string(),
            slug: slug.map(str::to_string),
            description: None,
            image: None,
            status: true,
        }
    }

    fn stored(name: &str, slug: &str) -> Category {
        Category {
            id: 1,
            name: name.to_string(),
            slug: slug.to_string(),
            description: Some("Description for Electronics".to_string()),
            image: None,
            status: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_create_derives_missing_slug() {
        let normalized = normalize_before_create(new_category("Electronics", None)).unwrap();
        assert_eq!(normalized.slug.as_deref(), Some("electronics"));

        let normalized = normalize_before_create(new_category("Home & Garden", Some("  "))).unwrap();
        assert_eq!(normalized.slug.as_deref(), Some("home-garden"));
    }

    #[test]
    fn test_create_derives_slug_for_any_name() {
        for _ in 0..25 {
            let name: String = CompanyName().fake();
            let normalized = normalize_before_create(new_category(&name, None)).unwrap();
            assert_eq!(normalized.slug, Some(slugify(&name)));
        }
    }

    #[test]
    fn test_create_keeps_supplied_slug() {
        let normalized =
            normalize_before_create(new_category("Electronics", Some("gadgets"))).unwrap();
        assert_eq!(normalized.slug.as_deref(), Some("gadgets"));
    }

    #[test]
    fn test_create_rejects_unsluggable_name() {
        assert!(matches!(
            normalize_before_create(new_category("!!!", None)),
            Err(AppError::InvalidFields(_))
        ));
    }

    #[test]
    fn test_create_rejects_name_whose_slug_overflows() {
        let name = "Ж".repeat(255);
        assert!(matches!(
            normalize_before_create(new_category(&name, None)),
            Err(AppError::InvalidFields(ref errs)) if errs.field_errors().contains_key("name")
        ));

        let fits = "Ж".repeat(127);
        let normalized = normalize_before_create(new_category(&fits, None)).unwrap();
        assert_eq!(normalized.slug.map(|s| s.len()), Some(254));
    }

    #[test]
    fn test_rename_rejects_name_whose_slug_overflows() {
        let existing = stored("Electronics", "electronics");
        let changes = CategoryChanges {
            name: Some("Щ".repeat(100)),
            ..Default::default()
        };
        assert!(matches!(
            normalize_before_update(&existing, changes),
            Err(AppError::InvalidFields(_))
        ));
    }

    #[test]
    fn test_update_with_new_name_regenerates_slug() {
        let existing = stored("Electronics", "hand-picked");
        let changes = CategoryChanges {
            name: Some("Consumer Electronics".to_string()),
            ..Default::default()
        };
        let normalized = normalize_before_update(&existing, changes).unwrap();
        assert_eq!(normalized.slug.as_deref(), Some("consumer-electronics"));
    }

    #[test]
    fn test_update_other_fields_keeps_slug() {
        let existing = stored("Electronics", "hand-picked");
        let changes = CategoryChanges {
            name: Some("Electronics".to_string()),
            description: Some(Some("Gadgets and more".to_string())),
            status: Some(false),
            ..Default::default()
        };
        let normalized = normalize_before_update(&existing, changes).unwrap();
        assert_eq!(normalized.slug, None);
        assert_eq!(
            normalized.description,
            Some(Some("Gadgets and more".to_string()))
        );
    }

    #[test]
    fn test_update_ignores_slug_without_name_change() {
        let existing = stored("Electronics", "electronics");
        let changes = CategoryChanges {
            slug: Some("sneaky".to_string()),
            ..Default::default()
        };
        assert_eq!(normalize_before_update(&existing, changes).unwrap().slug, None);
    }
}
