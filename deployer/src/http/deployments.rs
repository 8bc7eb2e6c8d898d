//! Deployment API client

use crate::errors::DeployError;
use crate::http::client::HttpClient;
use crate::models::deployment::{CreatedDeployment, DeploymentStatus};
use crate::models::manifest::DeploymentPayload;

/// Creation endpoint, always asks for a fresh deployment
pub const CREATE_DEPLOYMENT_PATH: &str = "/v6/now/deployments?forceNew=1";

/// Error code returned when the payload references digests that were never uploaded
pub const MISSING_FILES_CODE: &str = "missing_files";

/// Status endpoint for a deployment
pub fn deployment_path(deployment_id: &str) -> String {
    format!("/v3/now/deployments/{}", deployment_id)
}

impl HttpClient {
    /// Create a deployment from a manifest
    pub async fn create_deployment(
        &self,
        payload: &DeploymentPayload,
    ) -> Result<CreatedDeployment, DeployError> {
        match self.post(CREATE_DEPLOYMENT_PATH, payload).await {
            Err(DeployError::RemoteApi {
                code: Some(code), ..
            }) if code == MISSING_FILES_CODE => Err(DeployError::MissingFiles),
            result => result,
        }
    }

    /// Get the current status of a deployment
    pub async fn get_deployment(&self, deployment_id: &str) -> Result<DeploymentStatus, DeployError> {
        self.get(&deployment_path(deployment_id)).await
    }
}
