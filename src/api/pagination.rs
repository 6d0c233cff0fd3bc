use std::future::Future;

use serde::{Deserialize, Serialize};

pub(crate) const DEFAULT_LIMIT: i64 = 10;
pub(crate) const MAX_LIMIT: i64 = 100;

/// `page` is 1-based. Out-of-range values are clamped rather than rejected.
#[derive(Debug, Clone, Copy, Deserialize)]
pub(crate) struct PageParams {
    #[serde(default = "default_page")]
    pub(crate) page: i64,
    #[serde(default = "default_limit")]
    pub(crate) limit: i64,
}

impl Default for PageParams {
    fn default() -> Self {
        Self { page: default_page(), limit: default_limit() }
    }
}

impl PageParams {
    /// For query structs that carry `page`/`limit` next to their own filters.
    pub(crate) fn from_query(page: Option<i64>, limit: Option<i64>) -> Self {
        Self { page: page.unwrap_or_else(default_page), limit: limit.unwrap_or_else(default_limit) }
            .normalized()
    }

    pub(crate) fn normalized(self) -> Self {
        Self { page: self.page.max(1), limit: self.limit.clamp(1, MAX_LIMIT) }
    }

    pub(crate) fn offset(self) -> i64 {
        let normalized = self.normalized();
        (normalized.page - 1).saturating_mul(normalized.limit)
    }
}

const fn default_page() -> i64 {
    1
}

const fn default_limit() -> i64 {
    DEFAULT_LIMIT
}

#[derive(Debug, Serialize)]
pub(crate) struct PaginatedResponse<T> {
    pub(crate) items: Vec<T>,
    pub(crate) total_count: i64,
    pub(crate) page: i64,
    pub(crate) limit: i64,
    pub(crate) total_pages: i64,
}

impl<T> PaginatedResponse<T> {
    pub(crate) fn new(items: Vec<T>, total_count: i64, params: PageParams) -> Self {
        let params = params.normalized();
        let total_pages =
            if total_count <= 0 { 0 } else { (total_count + params.limit - 1) / params.limit };
        Self { items, total_count, page: params.page, limit: params.limit, total_pages }
    }
}

/// Listings read their total from a `COUNT(*) OVER()` column, which an empty
/// page past the end cannot carry; `count` runs only in that case.
pub(crate) async fn resolve_total<F, Fut>(
    window_total: Option<i64>,
    params: PageParams,
    count: F,
) -> Result<i64, sqlx::Error>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<i64, sqlx::Error>>,
{
    match window_total {
        Some(total) => Ok(total),
        None if params.offset() > 0 => count().await,
        None => Ok(0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn params_are_clamped() {
        let params = PageParams { page: 0, limit: 1000 }.normalized();
        assert_eq!(params.page, 1);
        assert_eq!(params.limit, MAX_LIMIT);
        assert_eq!(PageParams { page: 3, limit: 0 }.normalized().limit, 1);
    }

    #[test]
    fn offset_follows_page() {
        assert_eq!(PageParams { page: 1, limit: 10 }.offset(), 0);
        assert_eq!(PageParams { page: 3, limit: 25 }.offset(), 50);
        assert_eq!(PageParams { page: -4, limit: 10 }.offset(), 0);
    }

    #[test]
    fn total_pages_rounds_up() {
        let params = PageParams { page: 1, limit: 10 };
        assert_eq!(PaginatedResponse::<()>::new(Vec::new(), 0, params).total_pages, 0);
        assert_eq!(PaginatedResponse::<()>::new(Vec::new(), 10, params).total_pages, 1);
        assert_eq!(PaginatedResponse::<()>::new(Vec::new(), 11, params).total_pages, 2);
    }

    #[test]
    fn from_query_fills_and_clamps() {
        let params = PageParams::from_query(None, Some(500));
        assert_eq!(params.page, 1);
        assert_eq!(params.limit, MAX_LIMIT);
        assert_eq!(PageParams::from_query(Some(2), None).limit, DEFAULT_LIMIT);
    }

    #[tokio::test]
    async fn total_falls_back_to_count_only_past_the_end() {
        let past_end = PageParams { page: 5, limit: 1 };
        let total =
            resolve_total(None, past_end, || async { Ok::<_, sqlx::Error>(2) }).await.unwrap();
        assert_eq!(total, 2);
        assert_eq!(PaginatedResponse::<()>::new(Vec::new(), total, past_end).total_pages, 2);

        let not_called = || async { Err::<i64, _>(sqlx::Error::RowNotFound) };
        let first = PageParams { page: 1, limit: 10 };
        assert_eq!(resolve_total(None, first, not_called).await.unwrap(), 0);
        assert_eq!(resolve_total(Some(7), past_end, not_called).await.unwrap(), 7);
    }

    #[test]
    fn defaults_apply_when_missing() {
        let params: PageParams = serde_json::from_str("{}").unwrap();
        assert_eq!(params.page, 1);
        assert_eq!(params.limit, DEFAULT_LIMIT);
    }
}
