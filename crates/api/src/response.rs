//! Shared response types for API handlers.

use serde::Serialize;

/// Pagination block attached to listing responses.
#[derive(Debug, Clone, Serialize)]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub total_pages: i64,
}

impl Pagination {
    /// Build a pagination block from the effective page/limit and the total
    /// match count.
    pub fn new(page: i64, limit: i64, total: i64) -> Self {
        let page = page.max(1);
        let limit = limit.max(1);
        Self {
            page,
            limit,
            total,
            total_pages: (total + limit - 1) / limit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_pages_rounds_up() {
        assert_eq!(Pagination::new(1, 20, 0).total_pages, 0);
        assert_eq!(Pagination::new(1, 20, 20).total_pages, 1);
        assert_eq!(Pagination::new(1, 20, 21).total_pages, 2);
    }
}
