//! Files API client

use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::Method;
use serde_json::Value;

use crate::errors::DeployError;
use crate::http::client::HttpClient;

/// Upload endpoint, files are addressed by their digest
pub const FILES_PATH: &str = "/v2/now/files";

pub const DIGEST_HEADER: &str = "x-now-digest";
pub const SIZE_HEADER: &str = "x-now-size";

impl HttpClient {
    /// Upload one file's raw contents under its digest
    pub async fn upload_file(&self, body: &[u8], digest: &str) -> Result<Value, DeployError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/octet-stream"),
        );
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from(body.len()));
        headers.insert(
            DIGEST_HEADER,
            HeaderValue::from_str(digest).map_err(|e| {
                DeployError::ConfigError(format!("Invalid digest {}: {}", digest, e))
            })?,
        );
        headers.insert(SIZE_HEADER, HeaderValue::from(body.len()));

        let response = self
            .fetch_with_auth(Method::POST, FILES_PATH, headers, Some(body.to_vec()))
            .await?;
        self.read_json(FILES_PATH, response, Some(digest)).await
    }
}
