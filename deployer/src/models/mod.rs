//! Wire models for the deployment API

pub mod deployment;
pub mod manifest;
