//! Common query parameter types

use serde::Deserialize;

/// Query parameters for collection endpoints.
///
/// Each endpoint reads `page` and `limit` plus at most one resource filter:
/// `status` for posts and pages, `mime_type` for media, `slug` for terms.
#[derive(Debug, Clone, Deserialize)]
pub struct ListQuery {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
}

fn default_page() -> i64 {
    1
}

fn default_limit() -> i64 {
    10
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            page: default_page(),
            limit: default_limit(),
            status: None,
            mime_type: None,
            slug: None,
        }
    }
}
