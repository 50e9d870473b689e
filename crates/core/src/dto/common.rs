//! Envelopes shared by several endpoints.

use serde::{Deserialize, Serialize};

/// Error body returned by every failing endpoint: `{message, status, code?}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiErrorBody {
    /// Human-readable description of the failure.
    pub message: String,
    /// HTTP status the body was delivered with.
    pub status: u16,
    /// Optional machine-readable error code (e.g. `CATEGORY_IN_USE`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

/// Pagination envelope for list endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    /// Items on this page.
    pub items: Vec<T>,
    /// Total number of matching items across all pages.
    pub total: u64,
    /// 1-based page number.
    pub page: u32,
    /// Requested page size.
    pub page_size: u32,
}

impl<T> Page<T> {
    /// An empty first page.
    #[must_use]
    pub const fn empty(page_size: u32) -> Self {
        Self {
            items: Vec::new(),
            total: 0,
            page: 1,
            page_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_body_code_is_optional() {
        let body: ApiErrorBody =
            serde_json::from_str(r#"{"message":"Not found","status":404}"#).expect("deserialize");
        assert_eq!(body.status, 404);
        assert_eq!(body.code, None);

        let body: ApiErrorBody = serde_json::from_str(
            r#"{"message":"Conflict","status":409,"code":"CATEGORY_IN_USE"}"#,
        )
        .expect("deserialize");
        assert_eq!(body.code.as_deref(), Some("CATEGORY_IN_USE"));
    }

    #[test]
    fn test_page_uses_camel_case_field_names() {
        let json = r#"{"items":[1,2],"total":2,"page":1,"pageSize":20}"#;
        let page: Page<u32> = serde_json::from_str(json).expect("deserialize");
        assert_eq!(page.items, vec![1, 2]);
        assert_eq!(page.page_size, 20);
    }
}
