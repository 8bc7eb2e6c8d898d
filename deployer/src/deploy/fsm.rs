//! State machine for deployment status polling

use crate::models::deployment::DeploymentState;

/// What the poller should do after a status observation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollStep {
    /// Non-terminal state, wait and poll again
    Continue,

    /// Deployment is ready
    Ready,

    /// Deployment ended in ERROR
    Failed,

    /// Attempt budget spent without reaching a terminal state
    Exhausted,
}

/// Poll FSM
#[derive(Debug, Clone)]
pub struct PollFsm {
    max_attempts: u32,
    attempts: u32,
    state: Option<DeploymentState>,
}

impl PollFsm {
    /// Create a new FSM allowing `max_attempts` status checks
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            attempts: 0,
            state: None,
        }
    }

    /// Last observed state, `None` before the first observation
    pub fn state(&self) -> Option<&DeploymentState> {
        self.state.as_ref()
    }

    /// Status checks made so far
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Whether another status check is allowed
    pub fn can_poll(&self) -> bool {
        self.attempts < self.max_attempts && !self.is_done()
    }

    /// Whether a terminal state was observed
    pub fn is_done(&self) -> bool {
        self.state.as_ref().is_some_and(DeploymentState::is_terminal)
    }

    /// Record one status check and decide the next step
    pub fn observe(&mut self, state: DeploymentState) -> PollStep {
        self.attempts += 1;

        let step = match &state {
            DeploymentState::Ready => PollStep::Ready,
            DeploymentState::Error => PollStep::Failed,
            DeploymentState::Pending(_) if self.attempts >= self.max_attempts => {
                PollStep::Exhausted
            }
            DeploymentState::Pending(_) => PollStep::Continue,
        };

        self.state = Some(state);
        step
    }
}
