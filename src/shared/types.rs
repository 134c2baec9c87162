use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::shared::constants::CATALOG_PAGE_SIZE;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    pub meta: Option<Meta>,
    pub errors: Option<Vec<String>>,
}

/// Pagination metadata attached to list responses
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Meta {
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub last_page: i64,
}

impl Meta {
    pub fn paginated(total: i64, page: &PaginationQuery) -> Self {
        let per_page = page.limit();
        // An empty table still has one (empty) page
        let last_page = ((total + per_page - 1) / per_page).max(1);
        Self {
            total,
            page: page.page(),
            per_page,
            last_page,
        }
    }
}

// =============================================================================
// PAGINATION
// =============================================================================

/// Page selector for catalog listings; the page size is fixed.
#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct PaginationQuery {
    /// Page number (1-indexed, default: 1)
    #[serde(default = "default_page")]
    #[param(minimum = 1)]
    pub page: i64,
}

fn default_page() -> i64 {
    1
}

impl Default for PaginationQuery {
    fn default() -> Self {
        Self { page: 1 }
    }
}

impl PaginationQuery {
    /// Page number clamped to at least 1
    pub fn page(&self) -> i64 {
        self.page.max(1)
    }

    /// Calculate SQL OFFSET from page number; saturates for pages past the end
    pub fn offset(&self) -> i64 {
        (self.page() - 1).saturating_mul(self.limit())
    }

    pub fn limit(&self) -> i64 {
        CATALOG_PAGE_SIZE
    }
}

/// One page of items plus its metadata
#[derive(Debug)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub meta: Meta,
}

impl<T> ApiResponse<T> {
    pub fn success(data: Option<T>, message: Option<String>, meta: Option<Meta>) -> Self {
        Self {
            success: true,
            data,
            message,
            meta,
            errors: None,
        }
    }

    pub fn page(page: Page<T>, message: Option<String>) -> ApiResponse<Vec<T>> {
        ApiResponse {
            success: true,
            data: Some(page.items),
            message,
            meta: Some(page.meta),
            errors: None,
        }
    }

    pub fn error(message: Option<String>, errors: Option<Vec<String>>) -> ApiResponse<()> {
        ApiResponse {
            success: false,
            data: None,
            message,
            meta: None,
            errors,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_offsets() {
        assert_eq!(PaginationQuery { page: 1 }.offset(), 0);
        assert_eq!(PaginationQuery { page: 3 }.offset(), 20);
        assert_eq!(PaginationQuery { page: 0 }.offset(), 0);
        assert_eq!(PaginationQuery { page: -4 }.page(), 1);
        assert_eq!(PaginationQuery::default().limit(), 10);
    }

    #[test]
    fn test_huge_page_number_saturates_offset() {
        let page: PaginationQuery =
            serde_json::from_value(serde_json::json!({ "page": i64::MAX })).unwrap();
        assert_eq!(page.offset(), i64::MAX);

        let meta = Meta::paginated(11, &page);
        assert_eq!(meta.page, i64::MAX);
        assert_eq!(meta.last_page, 2);
    }

    #[test]
    fn test_meta_last_page() {
        let first = PaginationQuery::default();
        assert_eq!(Meta::paginated(0, &first).last_page, 1);
        assert_eq!(Meta::paginated(10, &first).last_page, 1);
        assert_eq!(Meta::paginated(11, &first).last_page, 2);

        let meta = Meta::paginated(25, &PaginationQuery { page: 2 });
        assert_eq!(
            meta,
            Meta {
                total: 25,
                page: 2,
                per_page: 10,
                last_page: 3
            }
        );
    }

    #[test]
    fn test_error_envelope_shape() {
        let body = serde_json::to_value(ApiResponse::<()>::error(
            Some("The given data was invalid.".to_string()),
            Some(vec!["name: required".to_string()]),
        ))
        .unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["errors"][0], "name: required");
        assert!(body["data"].is_null());
    }
}
