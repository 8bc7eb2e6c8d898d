//! Deployer configuration options

use std::time::Duration;

use secrecy::SecretString;

use crate::authn::token_mngr::TokenRefreshOptions;
use crate::deploy::manifest::PayloadOptions;
use crate::utils::RetryOptions;
use crate::workers::poller;

/// Default API host when `API_HOST` is unset
pub const DEFAULT_API_HOST: &str = "api.zeit.co";

/// Environment variables understood by the deployer
///
/// Empty values are treated as unset.
#[derive(Debug, Default)]
pub struct EnvSettings {
    /// `NOW_TOKEN`: static token, used as-is without registration
    pub static_token: Option<SecretString>,

    /// `API_HOST`: API host, with or without scheme
    pub api_host: Option<String>,

    /// `FORCE_BUILD_IN_REGION`: passed through to the build env
    pub force_build_in_region: Option<String>,

    /// `NOW_DEBUG`: passed through to the build env
    pub now_debug: Option<String>,

    /// `VERBOSE`: log request bodies and debug output
    pub verbose: bool,

    /// `ZEIT_TEAM_TOKEN`: credential for the registration endpoint
    pub team_token: Option<SecretString>,

    /// `ZEIT_REGISTRATION_URL`: endpoint handing out deployment tokens
    pub registration_url: Option<String>,
}

impl EnvSettings {
    /// Read settings from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through an arbitrary lookup function
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.is_empty());

        Self {
            static_token: get("NOW_TOKEN").map(SecretString::from),
            api_host: get("API_HOST"),
            force_build_in_region: get("FORCE_BUILD_IN_REGION"),
            now_debug: get("NOW_DEBUG"),
            verbose: get("VERBOSE").is_some(),
            team_token: get("ZEIT_TEAM_TOKEN").map(SecretString::from),
            registration_url: get("ZEIT_REGISTRATION_URL"),
        }
    }

    /// API base URL derived from `API_HOST`
    pub fn base_url(&self) -> String {
        base_url_for_host(self.api_host.as_deref().unwrap_or(DEFAULT_API_HOST))
    }
}

/// `https://<host>` unless the host already carries a scheme
pub fn base_url_for_host(host: &str) -> String {
    let host = host.trim_end_matches('/');
    if host.contains("://") {
        host.to_string()
    } else {
        format!("https://{}", host)
    }
}

/// Options for the deployment client
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// API base URL, no trailing slash
    pub base_url: String,

    /// Timeout of a single HTTP request
    pub request_timeout: Duration,

    /// Retries of requests that never reached the server
    pub transport_retry: RetryOptions,

    /// Retries of the token registration call
    pub registration_retry: RetryOptions,

    /// Token reuse policy
    pub token_refresh: TokenRefreshOptions,

    /// Status polling
    pub poller: poller::Options,

    /// Static parts of the deployment payload
    pub payload: PayloadOptions,

    /// Log request bodies
    pub verbose: bool,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            base_url: base_url_for_host(DEFAULT_API_HOST),
            request_timeout: Duration::from_secs(30),
            transport_retry: RetryOptions {
                retries: 3,
                delay: Duration::from_millis(500),
            },
            registration_retry: RetryOptions::default(),
            token_refresh: TokenRefreshOptions::default(),
            poller: poller::Options::default(),
            payload: PayloadOptions::default(),
            verbose: false,
        }
    }
}

impl ClientOptions {
    /// Defaults, adjusted by the environment
    pub fn from_env_settings(settings: &EnvSettings) -> Self {
        Self {
            base_url: settings.base_url(),
            payload: PayloadOptions {
                force_build_in_region: settings.force_build_in_region.clone(),
                now_debug: settings.now_debug.clone(),
                ..Default::default()
            },
            verbose: settings.verbose,
            ..Default::default()
        }
    }
}
