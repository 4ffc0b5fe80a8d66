//! Shared response types
//!
//! The paginated list envelope used by every collection endpoint.

use serde::{Deserialize, Serialize};

/// Paginated list envelope: `{data, total, page, limit, totalPages}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
    #[serde(rename = "totalPages")]
    pub total_pages: i64,
}

impl<T> Paginated<T> {
    /// Build the envelope. Page and limit are clamped to at least 1, so
    /// `totalPages = ceil(total / limit)` is always well defined.
    pub fn new(data: Vec<T>, total: i64, page: i64, limit: i64) -> Self {
        let page = page.max(1);
        let limit = limit.max(1);
        Self {
            data,
            total,
            page,
            limit,
            total_pages: total_pages(total, limit),
        }
    }
}

fn total_pages(total: i64, limit: i64) -> i64 {
    if total <= 0 {
        0
    } else {
        total.saturating_add(limit - 1) / limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_pages_math() {
        assert_eq!(Paginated::<i32>::new(vec![], 0, 1, 10).total_pages, 0);
        assert_eq!(Paginated::<i32>::new(vec![], 10, 1, 10).total_pages, 1);
        assert_eq!(Paginated::<i32>::new(vec![], 11, 1, 10).total_pages, 2);
        assert_eq!(Paginated::<i32>::new(vec![], 1, 1, 10).total_pages, 1);
    }

    #[test]
    fn test_clamps_page_and_limit() {
        let p = Paginated::<i32>::new(vec![], 5, 0, 0);
        assert_eq!(p.page, 1);
        assert_eq!(p.limit, 1);
        assert_eq!(p.total_pages, 5);
    }

    #[test]
    fn test_extreme_limit_does_not_overflow() {
        let p = Paginated::<i32>::new(vec![], 5, 1, i64::MAX);
        assert_eq!(p.total_pages, 1);
    }

    #[test]
    fn test_serializes_camel_case_total_pages() {
        let p = Paginated::new(vec![1, 2], 2, 1, 10);
        let json = serde_json::to_string(&p).unwrap();
        assert!(json.contains("\"totalPages\":1"));
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn total_pages_is_ceiling_division(total in 0i64..100_000, limit in 1i64..1_000) {
            let p = Paginated::<i32>::new(vec![], total, 1, limit);
            let expected = (total as f64 / limit as f64).ceil() as i64;
            prop_assert_eq!(p.total_pages, expected);
        }

        #[test]
        fn last_page_holds_everything(total in 1i64..100_000, limit in 1i64..1_000) {
            let p = Paginated::<i32>::new(vec![], total, 1, limit);
            prop_assert!(p.total_pages * limit >= total);
            prop_assert!((p.total_pages - 1) * limit < total);
        }
    }
}
