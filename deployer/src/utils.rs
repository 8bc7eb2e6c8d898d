//! Utility functions

use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};
use std::time::Duration;

/// Version information for the deployer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionInfo {
    pub version: String,
    pub git_hash: String,
    pub build_time: String,
}

/// Get version information
pub fn version_info() -> VersionInfo {
    VersionInfo {
        version: env!("CARGO_PKG_VERSION").to_string(),
        git_hash: option_env!("GIT_HASH").unwrap_or("unknown").to_string(),
        build_time: option_env!("BUILD_TIME").unwrap_or("unknown").to_string(),
    }
}

/// Fixed-delay retry policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryOptions {
    /// Retries after the first attempt
    pub retries: u32,

    /// Sleep between two attempts
    pub delay: Duration,
}

impl RetryOptions {
    /// Total number of attempts, the first one included
    pub fn max_attempts(&self) -> u32 {
        self.retries.saturating_add(1)
    }
}

impl Default for RetryOptions {
    fn default() -> Self {
        Self {
            retries: 5,
            delay: Duration::from_millis(500),
        }
    }
}

/// Generate a random UUID v4
pub fn generate_uuid() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Lowercase hex SHA-1 of data, the content address used by the files API
pub fn digest_of(data: &[u8]) -> String {
    let mut hasher = Sha1::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// URL-escaped prefix of a request body, for verbose request logs
pub fn body_preview(body: &[u8], max_len: usize) -> String {
    url::form_urlencoded::byte_serialize(body)
        .collect::<String>()
        .chars()
        .take(max_len)
        .collect()
}
