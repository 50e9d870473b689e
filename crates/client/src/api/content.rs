//! Content upload endpoint.

use reqwest::Method;
use reqwest::multipart::{Form, Part};
use tracing::instrument;

use clementine_core::ContentUploadResponse;

use crate::error::ApiError;
use crate::transport::Http;

/// `POST /api/v1/content/upload` (multipart/form-data).
#[derive(Clone)]
pub struct ContentApi {
    http: Http,
}

impl ContentApi {
    #[must_use]
    pub(crate) const fn new(http: Http) -> Self {
        Self { http }
    }

    /// Upload a file. The server only reads the multipart field named
    /// `file`.
    ///
    /// # Errors
    ///
    /// `413` for oversized uploads; normalized transport errors otherwise.
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    pub async fn upload(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<ContentUploadResponse, ApiError> {
        let part = Part::bytes(bytes).file_name(file_name.to_string());
        let form = Form::new().part("file", part);
        self.http
            .send(
                self.http
                    .request(Method::POST, "/api/v1/content/upload")
                    .multipart(form),
            )
            .await
    }
}
