//! Error types for the test deployer

use thiserror::Error;

/// Main error type for the test deployer
#[derive(Error, Debug)]
pub enum DeployError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("URL error: {0}")]
    UrlError(#[from] url::ParseError),

    /// Required environment configuration is missing or invalid
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// The project config file is missing or cannot be parsed
    #[error("Invalid {file}: {message}")]
    ProjectConfig { file: String, message: String },

    /// An endpoint answered with an error-shaped body or a failing status
    #[error("{message}")]
    RemoteApi {
        url: String,
        status: u16,
        code: Option<String>,
        message: String,
    },

    /// Deployment creation referenced digests the API has not received
    #[error("Missing files")]
    MissingFiles,

    /// The deployment reached the ERROR state
    #[error("State of {url} is {state}")]
    DeploymentFailed { url: String, state: String },

    /// The registration endpoint did not hand out a token within the retry budget
    #[error("Failed to fetch token after {attempts} attempts: {message}")]
    TokenFetch { attempts: u32, message: String },

    /// Polling gave up before the deployment reached a terminal state
    #[error("Deployment {url} did not become ready after {attempts} status checks")]
    Timeout { url: String, attempts: u32 },

    /// A response body could not be understood
    #[error("Invalid response from {url} ({status}): {message}")]
    InvalidResponse {
        url: String,
        status: u16,
        message: String,
    },
}

impl DeployError {
    /// True when the deployment was rejected because uploads were missing
    pub fn is_missing_files(&self) -> bool {
        matches!(self, DeployError::MissingFiles)
    }

    /// The remote error code, if the API supplied one
    pub fn remote_code(&self) -> Option<&str> {
        match self {
            DeployError::RemoteApi { code, .. } => code.as_deref(),
            _ => None,
        }
    }
}
