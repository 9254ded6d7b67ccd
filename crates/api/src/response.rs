//! Shared response envelope types for API handlers.
//!
//! All JSON responses use a `{ "data": ..., "total"?: ... }` envelope.
//! Use [`DataResponse`] instead of ad-hoc `serde_json::json!({ "data": ... })`.

use serde::Serialize;

/// Standard `{ "data": T }` response envelope.
///
/// # Example
///
/// ```ignore
/// Ok(Json(DataResponse::new(items)))
/// ```
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
    /// Row count for list endpoints.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<usize>,
}

impl<T: Serialize> DataResponse<T> {
    pub fn new(data: T) -> Self {
        Self { data, total: None }
    }
}

impl<T: Serialize> DataResponse<Vec<T>> {
    /// Envelope for a list, with `total` set to its length.
    pub fn list(data: Vec<T>) -> Self {
        let total = Some(data.len());
        Self { data, total }
    }
}
