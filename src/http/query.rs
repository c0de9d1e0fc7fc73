//! Query parameter types shared by list routes.

use crate::validation::{Field, Schema};
use serde::{Deserialize, Serialize};

pub const DEFAULT_LIMIT: u32 = 20;
pub const MAX_LIMIT: u32 = 100;

/// `limit`/`offset` pagination, as produced by [`PaginationQuery::schema`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationQuery {
    #[serde(default = "default_limit")]
    pub limit: u32,
    #[serde(default)]
    pub offset: u32,
}

fn default_limit() -> u32 {
    DEFAULT_LIMIT
}

impl Default for PaginationQuery {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            offset: 0,
        }
    }
}

impl PaginationQuery {
    /// Query schema: `limit` in 1..=100 (default 20), `offset` >= 0 (default 0).
    pub fn schema() -> Schema {
        Schema::object()
            .field(
                "limit",
                Field::integer().min(1).max(MAX_LIMIT).default(DEFAULT_LIMIT),
            )
            .field("offset", Field::integer().min(0).default(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::{InputSchema, InputSource};
    use serde_json::json;

    #[test]
    fn test_defaults_apply() {
        let value = PaginationQuery::schema().validate(json!({})).unwrap();
        let page: PaginationQuery = serde_json::from_value(value).unwrap();
        assert_eq!(page, PaginationQuery::default());
    }

    #[test]
    fn test_query_strings_are_coerced() {
        let value = PaginationQuery::schema()
            .validate_from(InputSource::Query, json!({"limit": "50", "offset": "10"}))
            .unwrap();
        let page: PaginationQuery = serde_json::from_value(value).unwrap();
        assert_eq!(page.limit, 50);
        assert_eq!(page.offset, 10);
    }

    #[test]
    fn test_limit_out_of_range() {
        let errors = PaginationQuery::schema()
            .validate_from(InputSource::Query, json!({"limit": "500"}))
            .unwrap_err();
        assert_eq!(errors[0].field, "limit");

        let errors = PaginationQuery::schema()
            .validate(json!({"limit": 0, "offset": -1}))
            .unwrap_err();
        assert_eq!(errors.len(), 2);
    }
}
