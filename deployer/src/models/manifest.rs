//! Deployment manifest models

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A file as it is referenced by the deployment manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    /// Hex SHA-1 of the file contents
    pub sha: String,

    /// Size in bytes
    pub size: u64,

    /// Path relative to the project root
    pub file: String,

    /// Unix mode, including the regular-file type bits
    pub mode: u32,
}

/// The project config file (`now.json`) as far as the deployer cares
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectConfig {
    /// Runtime environment
    #[serde(default)]
    pub env: Option<Map<String, Value>>,

    /// Build settings
    #[serde(default)]
    pub build: Option<ProjectBuildConfig>,

    /// Builder definitions, passed through untouched
    #[serde(default)]
    pub builds: Option<Value>,

    /// Routing rules, passed through untouched
    #[serde(default)]
    pub routes: Option<Value>,
}

/// `build` section of the project config
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectBuildConfig {
    /// Build-time environment
    #[serde(default)]
    pub env: Option<Map<String, Value>>,
}

/// Build section sent with the deployment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildSettings {
    pub env: Map<String, Value>,
}

/// Body of the deployment creation request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploymentPayload {
    pub version: u32,
    pub public: bool,
    pub name: String,
    pub env: Map<String, Value>,
    pub build: BuildSettings,
    pub files: Vec<FileEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub builds: Option<Value>,
    pub routes: Value,
    pub meta: Map<String, Value>,
}
