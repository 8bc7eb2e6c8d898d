//! Run a single test deployment from a directory

use std::path::PathBuf;

use tracing::info;

use crate::app::options::EnvSettings;
use crate::deploy::executor::Deployer;
use crate::errors::DeployError;
use crate::filesys::dir::Dir;
use crate::models::deployment::DeployResult;
use crate::utils::generate_uuid;

/// Options for a command line run
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Project directory to deploy
    pub dir: PathBuf,

    /// Uniqueness token, a fresh UUID when unset
    pub randomness: Option<String>,
}

/// Deploy the project directory and wait until it is ready
pub async fn run(options: RunOptions, settings: &EnvSettings) -> Result<DeployResult, DeployError> {
    let dir = Dir::new(&options.dir);
    if !dir.exists().await {
        return Err(DeployError::ConfigError(format!(
            "Project directory {} does not exist",
            dir.path().display()
        )));
    }

    let bodies = dir.read_bodies().await?;
    let randomness = options.randomness.unwrap_or_else(generate_uuid);
    info!(
        "Deploying {} with randomness {}",
        dir.path().display(),
        randomness
    );

    let deployer = Deployer::from_env_settings(settings)?;
    deployer.deploy(&bodies, &randomness).await
}
