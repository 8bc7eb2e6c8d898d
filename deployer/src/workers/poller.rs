//! Status poller: waits for a deployment to reach a terminal state

use std::future::Future;
use std::time::Duration;

use tracing::{debug, info};

use crate::deploy::fsm::{PollFsm, PollStep};
use crate::errors::DeployError;
use crate::models::deployment::DeploymentState;

/// Poller options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Options {
    /// Delay between two status checks
    pub interval: Duration,

    /// Maximum number of status checks
    pub max_attempts: u32,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            max_attempts: 750,
        }
    }
}

/// Poll until READY, ERROR or the attempt budget runs out
///
/// `fetch_state` performs one status check, `sleep_fn` waits between checks.
/// There is no sleep after the last check.
pub async fn run<P, PF, S, SF>(
    options: &Options,
    deployment_url: &str,
    mut fetch_state: P,
    sleep_fn: S,
) -> Result<DeploymentState, DeployError>
where
    P: FnMut() -> PF,
    PF: Future<Output = Result<DeploymentState, DeployError>>,
    S: Fn(Duration) -> SF,
    SF: Future<Output = ()>,
{
    let mut fsm = PollFsm::new(options.max_attempts);

    while fsm.can_poll() {
        let state = fetch_state().await?;
        debug!("Deployment {} is {}", deployment_url, state);

        match fsm.observe(state) {
            PollStep::Ready => {
                info!("Deployment {} is ready after {} checks", deployment_url, fsm.attempts());
                return Ok(DeploymentState::Ready);
            }
            PollStep::Failed => {
                return Err(DeployError::DeploymentFailed {
                    url: deployment_url.to_string(),
                    state: DeploymentState::Error.to_string(),
                });
            }
            PollStep::Exhausted => break,
            PollStep::Continue => sleep_fn(options.interval).await,
        }
    }

    Err(DeployError::Timeout {
        url: deployment_url.to_string(),
        attempts: fsm.attempts(),
    })
}
