use serde::{Deserialize, Serialize};
use validator::Validate;

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_LIMIT: i64 = 10;

/// `?page&limit` query parameters, both 1-based and optional
#[derive(Debug, Clone, Copy, Default, Deserialize, Validate)]
pub struct PageQuery {
    #[validate(range(min = 1, message = "page must not be less than 1"))]
    pub page: Option<i64>,
    #[validate(range(min = 1, message = "limit must not be less than 1"))]
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub limit: i64,
}

impl From<PageQuery> for PageRequest {
    fn from(query: PageQuery) -> Self {
        PageRequest {
            page: query.page.unwrap_or(DEFAULT_PAGE),
            limit: query.limit.unwrap_or(DEFAULT_LIMIT),
        }
    }
}

impl PageRequest {
    pub fn skip(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

/// Metadata returned by the user listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BasicMeta {
    pub total: i64,
    pub page: i64,
}

/// Metadata returned by the post listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub total: i64,
    pub page: i64,
    pub last_page: i64,
    pub has_next_page: bool,
    pub has_prev_page: bool,
}

impl PageMeta {
    pub fn new(total: i64, request: PageRequest) -> Self {
        let last_page = if total <= 0 { 0 } else { (total - 1) / request.limit + 1 };
        PageMeta {
            total,
            page: request.page,
            last_page,
            has_next_page: request.page < last_page,
            has_prev_page: request.page > 1,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Paginated<T, M> {
    pub data: Vec<T>,
    pub meta: M,
}
