//! Deployment models

use std::fmt;

use serde::{Deserialize, Serialize};

/// Error object embedded in failing API responses
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiError {
    /// Machine readable code, e.g. `missing_files`
    #[serde(default)]
    pub code: Option<String>,

    /// Human readable message
    #[serde(default)]
    pub message: Option<String>,
}

/// Response of the deployment creation endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatedDeployment {
    /// Unique deployment ID
    pub id: String,

    /// Hostname the deployment is served from, without scheme
    pub url: String,
}

/// Response of the deployment status endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentStatus {
    /// Remote state, open-ended
    #[serde(default)]
    pub state: Option<String>,
}

/// A created deployment and the last state observed for it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentRecord {
    pub id: String,
    pub url: String,
    pub state: DeploymentState,
}

/// Deployment state as reported by the API
///
/// Only `READY` and `ERROR` are terminal, every other value is treated as pending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeploymentState {
    /// Terminal success
    Ready,

    /// Terminal failure
    Error,

    /// Anything else (`QUEUED`, `BUILDING`, `INITIALIZING`, ...)
    Pending(String),
}

impl DeploymentState {
    /// Whether no further transitions happen after this state
    pub fn is_terminal(&self) -> bool {
        matches!(self, DeploymentState::Ready | DeploymentState::Error)
    }

    pub fn as_str(&self) -> &str {
        match self {
            DeploymentState::Ready => "READY",
            DeploymentState::Error => "ERROR",
            DeploymentState::Pending(state) => state.as_str(),
        }
    }
}

impl From<&str> for DeploymentState {
    fn from(s: &str) -> Self {
        match s {
            "READY" => DeploymentState::Ready,
            "ERROR" => DeploymentState::Error,
            other => DeploymentState::Pending(other.to_string()),
        }
    }
}

impl From<Option<String>> for DeploymentState {
    fn from(state: Option<String>) -> Self {
        match state {
            Some(s) => DeploymentState::from(s.as_str()),
            None => DeploymentState::Pending(String::new()),
        }
    }
}

impl fmt::Display for DeploymentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a full deployment run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployResult {
    pub deployment_id: String,
    pub deployment_url: String,
}
