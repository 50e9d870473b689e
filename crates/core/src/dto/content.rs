//! Content upload DTOs.

use serde::{Deserialize, Serialize};

/// Response of `POST /api/v1/content/upload`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentUploadResponse {
    pub id: String,
    /// Public URL where the uploaded file is served from.
    pub url: String,
}
