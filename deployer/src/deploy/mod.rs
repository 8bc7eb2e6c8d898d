//! Test deployments: manifest, upload, creation and polling

pub mod executor;
pub mod fsm;
pub mod manifest;

use crate::errors::DeployError;
use crate::models::deployment::DeployResult;

pub use executor::Deployer;
pub use manifest::Bodies;

/// Deploy in-memory files with settings taken from the environment
pub async fn now_deploy(bodies: &Bodies, randomness: &str) -> Result<DeployResult, DeployError> {
    Deployer::from_env()?.deploy(bodies, randomness).await
}
