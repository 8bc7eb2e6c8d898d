//! Deployment executor

use std::sync::Arc;

use tracing::{debug, info};

use crate::app::options::{ClientOptions, EnvSettings};
use crate::authn::token_mngr::{token_source_from_env, AuthSession};
use crate::deploy::manifest::{build_payload, Bodies};
use crate::errors::DeployError;
use crate::http::client::{build_client, HttpClient};
use crate::models::deployment::{CreatedDeployment, DeployResult, DeploymentRecord, DeploymentState};
use crate::models::manifest::{DeploymentPayload, FileEntry};
use crate::workers::poller;

/// Runs test deployments against the API
pub struct Deployer {
    http: HttpClient,
    options: ClientOptions,
}

impl Deployer {
    /// Create a deployer with an existing token session
    pub fn new(options: ClientOptions, auth: Arc<AuthSession>) -> Result<Self, DeployError> {
        let http = HttpClient::new(&options, auth)?;
        Ok(Self { http, options })
    }

    /// Create a deployer configured from the process environment
    pub fn from_env() -> Result<Self, DeployError> {
        Self::from_env_settings(&EnvSettings::from_env())
    }

    /// Create a deployer from already collected environment settings
    ///
    /// Fails right away when no way to obtain a token is configured.
    pub fn from_env_settings(settings: &EnvSettings) -> Result<Self, DeployError> {
        let options = ClientOptions::from_env_settings(settings);
        let client = build_client(&options)?;
        let source = token_source_from_env(settings, client.clone(), options.registration_retry)?;
        let auth = Arc::new(AuthSession::new(source, options.token_refresh));
        let http = HttpClient::with_client(client, &options, auth);
        Ok(Self { http, options })
    }

    /// Underlying API client
    pub fn http(&self) -> &HttpClient {
        &self.http
    }

    /// Upload every manifest file, one at a time
    pub async fn upload_files(&self, bodies: &Bodies, files: &[FileEntry]) -> Result<(), DeployError> {
        for entry in files {
            let body = bodies.get(&entry.file).ok_or_else(|| {
                DeployError::ConfigError(format!("No contents for manifest file {}", entry.file))
            })?;
            debug!("Uploading {} ({} bytes, {})", entry.file, entry.size, entry.sha);
            self.http.upload_file(body, &entry.sha).await?;
        }
        Ok(())
    }

    /// Create the deployment, all files must be uploaded already
    pub async fn create(&self, payload: &DeploymentPayload) -> Result<CreatedDeployment, DeployError> {
        let created = self.http.create_deployment(payload).await?;
        info!("id {}", created.id);
        info!("deploymentUrl https://{}", created.url);
        Ok(created)
    }

    /// Poll the deployment until it is ready
    pub async fn wait_until_ready(
        &self,
        created: &CreatedDeployment,
    ) -> Result<DeploymentRecord, DeployError> {
        let http = &self.http;
        let id = created.id.as_str();

        let state = poller::run(
            &self.options.poller,
            &created.url,
            move || async move {
                let status = http.get_deployment(id).await?;
                Ok(DeploymentState::from(status.state))
            },
            tokio::time::sleep,
        )
        .await?;

        Ok(DeploymentRecord {
            id: created.id.clone(),
            url: created.url.clone(),
            state,
        })
    }

    /// Upload, create and wait for a deployment of `bodies`
    ///
    /// `randomness` ends up in the deployment env so every run is a distinct deployment.
    pub async fn deploy(&self, bodies: &Bodies, randomness: &str) -> Result<DeployResult, DeployError> {
        let payload = build_payload(bodies, randomness, &self.options.payload)?;

        info!("posting {} files", payload.files.len());
        self.upload_files(bodies, &payload.files).await?;

        let created = self.create(&payload).await?;
        let record = self.wait_until_ready(&created).await?;

        Ok(DeployResult {
            deployment_id: record.id,
            deployment_url: record.url,
        })
    }
}
