//! Test Deployer Library
//!
//! Uploads in-memory project files to the deployment API, creates a
//! deployment and polls it until it is READY or ERROR.

pub mod app;
pub mod authn;
pub mod deploy;
pub mod errors;
pub mod filesys;
pub mod http;
pub mod logs;
pub mod models;
pub mod utils;
pub mod workers;

pub use deploy::{now_deploy, Bodies, Deployer};
pub use errors::DeployError;
pub use models::deployment::DeployResult;
