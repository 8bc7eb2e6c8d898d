//! Token registration endpoint client

use async_trait::async_trait;
use reqwest::{header, Client};
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tracing::{debug, error, warn};
use url::Url;

use crate::authn::token_mngr::TokenSource;
use crate::errors::DeployError;
use crate::utils::RetryOptions;

/// Exchanges the team token for a deployment token
pub struct RegistrationClient {
    client: Client,
    url: Url,
    team_token: SecretString,
    retry: RetryOptions,
}

impl RegistrationClient {
    /// Create a new registration client
    pub fn new(
        client: Client,
        url: &str,
        team_token: SecretString,
        retry: RetryOptions,
    ) -> Result<Self, DeployError> {
        let url = Url::parse(url).map_err(|e| {
            DeployError::ConfigError(format!("Invalid registration URL {}: {}", url, e))
        })?;

        Ok(Self {
            client,
            url,
            team_token,
            retry,
        })
    }

    /// Registration endpoint
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Fetch a token, retrying every failure with a fixed delay
    pub async fn fetch_token_with_retry(&self) -> Result<SecretString, DeployError> {
        let max_attempts = self.retry.max_attempts();
        let mut attempt = 0;

        loop {
            attempt += 1;

            match self.request_token().await {
                Ok(token) => {
                    debug!("Fetched deployment token on attempt {}", attempt);
                    return Ok(SecretString::from(token));
                }
                Err(e) => {
                    let remaining = max_attempts.saturating_sub(attempt);
                    warn!("Failed to fetch token. Retries remaining: {}", remaining);
                    if remaining == 0 {
                        error!("Giving up on token registration: {}", e);
                        return Err(DeployError::TokenFetch {
                            attempts: attempt,
                            message: e.to_string(),
                        });
                    }
                    tokio::time::sleep(self.retry.delay).await;
                }
            }
        }
    }

    /// One registration round-trip
    async fn request_token(&self) -> Result<String, DeployError> {
        let response = self
            .client
            .post(self.url.clone())
            .header(
                header::AUTHORIZATION,
                format!("Bearer {}", self.team_token.expose_secret()),
            )
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(self.invalid(
                status.as_u16(),
                format!("Unexpected status from registration: {}", status.as_u16()),
            ));
        }

        let data: Value = response.json().await?;
        if data.is_null() {
            return Err(self.invalid(
                status.as_u16(),
                "Unexpected response from registration: no body".to_string(),
            ));
        }

        match data.get("token").and_then(Value::as_str) {
            Some(token) if !token.is_empty() => Ok(token.to_string()),
            _ => Err(self.invalid(
                status.as_u16(),
                format!("Unexpected response from registration: {}", data),
            )),
        }
    }

    fn invalid(&self, status: u16, message: String) -> DeployError {
        DeployError::InvalidResponse {
            url: self.url.to_string(),
            status,
            message,
        }
    }
}

#[async_trait]
impl TokenSource for RegistrationClient {
    async fn fetch_token(&self) -> Result<SecretString, DeployError> {
        self.fetch_token_with_retry().await
    }
}
