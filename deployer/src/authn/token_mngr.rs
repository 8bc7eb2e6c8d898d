//! Token manager: hands out bearer tokens and rotates them after a fixed number of uses

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::app::options::EnvSettings;
use crate::authn::registration::RegistrationClient;
use crate::errors::DeployError;
use crate::utils::RetryOptions;

/// Where fresh tokens come from
#[async_trait]
pub trait TokenSource: Send + Sync {
    /// Obtain a new token
    async fn fetch_token(&self) -> Result<SecretString, DeployError>;
}

/// A fixed, operator supplied token
pub struct StaticToken {
    token: SecretString,
}

impl StaticToken {
    pub fn new(token: SecretString) -> Self {
        Self { token }
    }
}

#[async_trait]
impl TokenSource for StaticToken {
    async fn fetch_token(&self) -> Result<SecretString, DeployError> {
        Ok(SecretString::from(self.token.expose_secret().to_string()))
    }
}

/// Pick the token source from the environment
///
/// A static token wins; otherwise a team token and a registration URL are required.
pub fn token_source_from_env(
    settings: &EnvSettings,
    client: Client,
    retry: RetryOptions,
) -> Result<Box<dyn TokenSource>, DeployError> {
    if let Some(token) = &settings.static_token {
        info!("Using NOW_TOKEN for test deployment");
        return Ok(Box::new(StaticToken::new(SecretString::from(
            token.expose_secret().to_string(),
        ))));
    }

    match (&settings.team_token, &settings.registration_url) {
        (Some(team_token), Some(url)) => Ok(Box::new(RegistrationClient::new(
            client,
            url,
            SecretString::from(team_token.expose_secret().to_string()),
            retry,
        )?)),
        _ => Err(DeployError::ConfigError(
            "Failed to create test deployment. Did you forget to set NOW_TOKEN?".to_string(),
        )),
    }
}

/// Token reuse policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenRefreshOptions {
    /// A new token is fetched once the use counter reaches this value
    pub max_uses: u32,
}

impl Default for TokenRefreshOptions {
    fn default() -> Self {
        Self { max_uses: 10 }
    }
}

#[derive(Default)]
struct SessionState {
    token: Option<SecretString>,
    uses: u32,
    refreshes: u32,
}

/// Bearer token session shared by every API call of a deployer
///
/// The lock is held while refreshing, so concurrent callers wait for the
/// refresh in flight instead of starting their own.
pub struct AuthSession {
    source: Box<dyn TokenSource>,
    options: TokenRefreshOptions,
    state: Mutex<SessionState>,
}

impl AuthSession {
    /// Create a session without a token, the first use fetches one
    pub fn new(source: Box<dyn TokenSource>, options: TokenRefreshOptions) -> Self {
        Self {
            source,
            options,
            state: Mutex::new(SessionState::default()),
        }
    }

    /// Token for the next request
    ///
    /// Counts one use and refreshes on the first call and whenever the count
    /// reaches `max_uses`, i.e. on calls 1, 11, 21, ... with the default of 10.
    pub async fn bearer(&self) -> Result<String, DeployError> {
        let mut state = self.state.lock().await;

        state.uses += 1;
        if state.token.is_none() || state.uses == self.options.max_uses {
            state.uses = 0;
            debug!("Fetching a new deployment token");
            let token = self.source.fetch_token().await?;
            state.token = Some(token);
            state.refreshes += 1;
        }

        match &state.token {
            Some(token) => Ok(token.expose_secret().to_string()),
            None => Err(DeployError::TokenFetch {
                attempts: 0,
                message: "no token available".to_string(),
            }),
        }
    }

    /// Number of tokens fetched so far
    pub async fn refresh_count(&self) -> u32 {
        self.state.lock().await.refreshes
    }
}
