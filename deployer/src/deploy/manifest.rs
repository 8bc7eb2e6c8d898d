//! Manifest building: file entries and the deployment payload

use std::collections::BTreeMap;
use std::path::Path;

use serde_json::{Map, Value};

use crate::errors::DeployError;
use crate::models::manifest::{BuildSettings, DeploymentPayload, FileEntry, ProjectConfig};
use crate::utils::digest_of;

/// In-memory project: relative path to raw contents
pub type Bodies = BTreeMap<String, Vec<u8>>;

/// Name of the project config file, never uploaded itself
pub const CONFIG_FILE_NAME: &str = "now.json";

/// Mode for shell scripts
pub const EXECUTABLE_MODE: u32 = 0o100755;

/// Mode for every other file
pub const REGULAR_MODE: u32 = 0o100644;

pub const RANDOMNESS_ENV_VAR: &str = "RANDOMNESS_ENV_VAR";
pub const RANDOMNESS_BUILD_ENV_VAR: &str = "RANDOMNESS_BUILD_ENV_VAR";

/// Settings that end up in the payload but do not come from the project
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadOptions {
    /// Deployment name
    pub name: String,

    /// Passed through as `FORCE_BUILD_IN_REGION` build env
    pub force_build_in_region: Option<String>,

    /// Passed through as `NOW_DEBUG` build env
    pub now_debug: Option<String>,
}

impl Default for PayloadOptions {
    fn default() -> Self {
        Self {
            name: "test2020".to_string(),
            force_build_in_region: None,
            now_debug: None,
        }
    }
}

/// File mode for a project path: executable for `.sh`, regular otherwise
pub fn file_mode(path: &str) -> u32 {
    match Path::new(path).extension().and_then(|ext| ext.to_str()) {
        Some("sh") => EXECUTABLE_MODE,
        _ => REGULAR_MODE,
    }
}

/// One entry per project file, the config file excluded
pub fn build_file_entries(bodies: &Bodies) -> Vec<FileEntry> {
    bodies
        .iter()
        .filter(|(name, _)| name.as_str() != CONFIG_FILE_NAME)
        .map(|(name, body)| FileEntry {
            sha: digest_of(body),
            size: body.len() as u64,
            file: name.clone(),
            mode: file_mode(name),
        })
        .collect()
}

/// Parse the project config out of the bodies
pub fn parse_project_config(bodies: &Bodies) -> Result<ProjectConfig, DeployError> {
    let raw = bodies
        .get(CONFIG_FILE_NAME)
        .ok_or_else(|| DeployError::ProjectConfig {
            file: CONFIG_FILE_NAME.to_string(),
            message: "file is missing".to_string(),
        })?;

    serde_json::from_slice(raw).map_err(|e| DeployError::ProjectConfig {
        file: CONFIG_FILE_NAME.to_string(),
        message: e.to_string(),
    })
}

/// Build the deployment creation payload
///
/// `randomness` is injected into both the runtime and the build environment so that
/// every test deployment is unique. Injected keys win over the project's own.
pub fn build_payload(
    bodies: &Bodies,
    randomness: &str,
    options: &PayloadOptions,
) -> Result<DeploymentPayload, DeployError> {
    let config = parse_project_config(bodies)?;

    let mut env = config.env.unwrap_or_default();
    env.insert(
        RANDOMNESS_ENV_VAR.to_string(),
        Value::String(randomness.to_string()),
    );

    let mut build_env = config.build.and_then(|b| b.env).unwrap_or_default();
    build_env.insert(
        RANDOMNESS_BUILD_ENV_VAR.to_string(),
        Value::String(randomness.to_string()),
    );
    if let Some(region) = &options.force_build_in_region {
        build_env.insert(
            "FORCE_BUILD_IN_REGION".to_string(),
            Value::String(region.clone()),
        );
    }
    if let Some(debug) = &options.now_debug {
        build_env.insert("NOW_DEBUG".to_string(), Value::String(debug.clone()));
    }

    Ok(DeploymentPayload {
        version: 2,
        public: true,
        name: options.name.clone(),
        env,
        build: BuildSettings { env: build_env },
        files: build_file_entries(bodies),
        builds: config.builds,
        routes: config.routes.unwrap_or_else(|| Value::Array(Vec::new())),
        meta: Map::new(),
    })
}
