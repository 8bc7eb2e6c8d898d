//! HTTP client implementation

use std::sync::Arc;

use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{Client, Method, Response};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tracing::{debug, error, warn};

use crate::app::options::ClientOptions;
use crate::authn::token_mngr::AuthSession;
use crate::errors::DeployError;
use crate::models::deployment::ApiError;
use crate::utils::{body_preview, RetryOptions};

/// Trace priority header sent with every API call
pub const TRACE_PRIORITY_HEADER: &str = "x-now-trace-priority";

/// Build the shared reqwest client
pub fn build_client(options: &ClientOptions) -> Result<Client, DeployError> {
    let client = Client::builder().timeout(options.request_timeout).build()?;
    Ok(client)
}

/// HTTP client for the deployment API
pub struct HttpClient {
    client: Client,
    base_url: String,
    auth: Arc<AuthSession>,
    transport_retry: RetryOptions,
    verbose: bool,
}

impl HttpClient {
    /// Create a new HTTP client
    pub fn new(options: &ClientOptions, auth: Arc<AuthSession>) -> Result<Self, DeployError> {
        Ok(Self::with_client(build_client(options)?, options, auth))
    }

    /// Create a new HTTP client on top of an existing reqwest client
    pub fn with_client(client: Client, options: &ClientOptions, auth: Arc<AuthSession>) -> Self {
        Self {
            client,
            base_url: options.base_url.trim_end_matches('/').to_string(),
            auth,
            transport_retry: options.transport_retry,
            verbose: options.verbose,
        }
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Token session used for authenticated calls
    pub fn auth(&self) -> &AuthSession {
        &self.auth
    }

    /// Send a request to the API
    ///
    /// Requests that fail before reaching the server are retried; HTTP
    /// statuses are passed back untouched.
    pub async fn fetch_api(
        &self,
        method: Method,
        path: &str,
        mut headers: HeaderMap,
        body: Option<Vec<u8>>,
    ) -> Result<Response, DeployError> {
        let url = format!("{}{}", self.base_url, path);

        if self.verbose {
            debug!("fetch {} {}", method, path);
            if let Some(body) = &body {
                debug!("{}", body_preview(body, 80));
            }
        }

        if !headers.contains_key(header::ACCEPT) {
            headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        }
        headers.insert(TRACE_PRIORITY_HEADER, HeaderValue::from_static("1"));

        let max_attempts = self.transport_retry.max_attempts();
        let mut attempt = 0;

        loop {
            attempt += 1;

            let mut request = self
                .client
                .request(method.clone(), &url)
                .headers(headers.clone());
            if let Some(body) = &body {
                request = request.body(body.clone());
            }

            match request.send().await {
                Ok(response) => return Ok(response),
                Err(e) if (e.is_connect() || e.is_timeout()) && attempt < max_attempts => {
                    warn!(
                        "{} {} failed ({}), retrying in {:?}",
                        method, path, e, self.transport_retry.delay
                    );
                    tokio::time::sleep(self.transport_retry.delay).await;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Send a request with a bearer token from the session
    ///
    /// An explicit `Authorization` header bypasses the session.
    pub async fn fetch_with_auth(
        &self,
        method: Method,
        path: &str,
        mut headers: HeaderMap,
        body: Option<Vec<u8>>,
    ) -> Result<Response, DeployError> {
        if !headers.contains_key(header::AUTHORIZATION) {
            let token = self.auth.bearer().await?;
            let value = HeaderValue::from_str(&format!("Bearer {}", token)).map_err(|e| {
                DeployError::ConfigError(format!("Token is not a valid header value: {}", e))
            })?;
            headers.insert(header::AUTHORIZATION, value);
        }

        self.fetch_api(method, path, headers, body).await
    }

    /// Parse an API response, turning error-shaped bodies into errors
    ///
    /// `digest` is only used to give upload failures some context in the logs.
    pub async fn read_json<T: DeserializeOwned>(
        &self,
        path: &str,
        response: Response,
        digest: Option<&str>,
    ) -> Result<T, DeployError> {
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.bytes().await?;

        let value: Value = serde_json::from_slice(&bytes).map_err(|e| {
            error!("Fetch Error: {} {} returned a non-JSON body", path, status);
            DeployError::InvalidResponse {
                url: path.to_string(),
                status: status.as_u16(),
                message: e.to_string(),
            }
        })?;

        if let Some(api_error) = value.get("error").filter(|e| !e.is_null()) {
            let api_error: ApiError = serde_json::from_value(api_error.clone()).unwrap_or_default();
            error!(
                url = %path,
                status = status.as_u16(),
                status_text = status.canonical_reason().unwrap_or(""),
                headers = ?headers,
                digest = digest.unwrap_or(""),
                "Fetch Error"
            );
            return Err(DeployError::RemoteApi {
                url: path.to_string(),
                status: status.as_u16(),
                message: api_error
                    .message
                    .unwrap_or_else(|| format!("Request to {} failed with status {}", path, status)),
                code: api_error.code,
            });
        }

        if !status.is_success() {
            error!(
                url = %path,
                status = status.as_u16(),
                headers = ?headers,
                digest = digest.unwrap_or(""),
                "Fetch Error"
            );
            return Err(DeployError::RemoteApi {
                url: path.to_string(),
                status: status.as_u16(),
                code: None,
                message: format!("Request to {} failed with status {}", path, status),
            });
        }

        serde_json::from_value(value).map_err(|e| DeployError::InvalidResponse {
            url: path.to_string(),
            status: status.as_u16(),
            message: e.to_string(),
        })
    }

    /// Make an authenticated GET request
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, DeployError> {
        let response = self
            .fetch_with_auth(Method::GET, path, HeaderMap::new(), None)
            .await?;
        self.read_json(path, response, None).await
    }

    /// Make an authenticated POST request with a JSON body
    pub async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, DeployError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        let body = serde_json::to_vec(body)?;

        let response = self
            .fetch_with_auth(Method::POST, path, headers, Some(body))
            .await?;
        self.read_json(path, response, None).await
    }
}
