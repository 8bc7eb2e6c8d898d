//! Test Deployer - Entry Point
//!
//! Deploys a project directory as a uniquely named test deployment and
//! prints the deployment id and URL once it is ready.

use std::collections::HashMap;
use std::env;
use std::path::PathBuf;

use anyhow::{bail, Context};
use tracing::error;

use test_deployer::app::options::EnvSettings;
use test_deployer::app::run::{run, RunOptions};
use test_deployer::logs::{init_logging, LogLevel, LogOptions};
use test_deployer::utils::version_info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command line arguments
    let args: Vec<String> = env::args().collect();
    let mut cli_args: HashMap<String, String> = HashMap::new();

    for arg in args.iter().skip(1) {
        if let Some((key, value)) = arg.split_once('=') {
            // Handle --key=value format
            let clean_key = key.trim_start_matches('-');
            cli_args.insert(clean_key.to_string(), value.to_string());
        } else if arg.starts_with("--") {
            // Handle standalone flags like --version
            let clean_key = arg.trim_start_matches('-');
            cli_args.insert(clean_key.to_string(), "true".to_string());
        }
    }

    // Print version and exit
    if cli_args.contains_key("version") {
        println!("{}", serde_json::to_string_pretty(&version_info())?);
        return Ok(());
    }

    let settings = EnvSettings::from_env();

    // Initialize logging
    let log_level = match cli_args.get("log-level") {
        Some(level) => level.parse::<LogLevel>().map_err(anyhow::Error::msg)?,
        None => LogLevel::for_verbosity(settings.verbose),
    };
    let log_options = LogOptions {
        log_level,
        json_format: cli_args.contains_key("json-logs"),
    };
    if let Err(e) = init_logging(log_options) {
        eprintln!("Failed to initialize logging: {e}");
    }

    let Some(dir) = cli_args.get("dir") else {
        bail!("Usage: test-deployer --dir=<project> [--randomness=<value>] [--log-level=<level>] [--json-logs]");
    };

    let options = RunOptions {
        dir: PathBuf::from(dir),
        randomness: cli_args.get("randomness").cloned(),
    };

    let result = match run(options, &settings).await {
        Ok(result) => result,
        Err(e) => {
            error!("Test deployment failed: {e}");
            return Err(e).context(format!("deploying {}", dir));
        }
    };

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
