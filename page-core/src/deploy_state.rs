//! Deployment lifecycle.
//!
//! `pending → in_progress → {completed | failed}`. Terminal states are final:
//! every event after completion or failure is ignored. The deploy client in
//! `page-deploy` performs the provider calls and feeds the results back here.

use std::time::Duration;

/// Status reported by a hosting provider for one deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteStatus {
    /// Still processing uploads.
    Processing,
    /// Live at `url`.
    Ready {
        /// Public URL.
        url: String,
    },
    /// The provider gave up.
    Error {
        /// Provider message.
        message: String,
    },
}

/// How long to wait for a deployment to go live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Delay between status polls.
    pub interval: Duration,
    /// Polls before giving up.
    pub max_polls: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(1000),
            max_polls: 30,
        }
    }
}

/// Deployment state machine - NO I/O, just state transitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeployState {
    /// Site provisioning / manifest not yet accepted.
    Pending,
    /// Deployment accepted by the provider.
    InProgress {
        /// Provider deployment id.
        deployment_id: String,
        /// Status polls made so far.
        polls: u32,
        /// Polling limits.
        policy: PollPolicy,
    },
    /// Deployment is live.
    Completed {
        /// Provider deployment id.
        deployment_id: String,
        /// Public URL.
        url: String,
    },
    /// Deployment failed.
    Failed {
        /// Human-readable reason.
        reason: String,
    },
}

/// Inputs to [`DeployState`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeployEvent {
    /// The provider accepted the manifest.
    Created {
        /// Provider deployment id.
        deployment_id: String,
        /// Polling limits for this deployment.
        policy: PollPolicy,
    },
    /// All required files were uploaded.
    UploadsFinished,
    /// A status poll returned.
    StatusReported(RemoteStatus),
    /// A provider call failed or timed out.
    Failed {
        /// Human-readable reason.
        reason: String,
    },
}

/// Instructions for the deploy client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeployAction {
    /// Upload the files listed as required.
    UploadRequired,
    /// Wait `delay`, then poll the deployment status.
    Poll {
        /// Delay before polling.
        delay: Duration,
    },
    /// Report success.
    Finish {
        /// Public URL.
        url: String,
    },
    /// Report failure.
    Abort {
        /// Human-readable reason.
        reason: String,
    },
}

impl DeployState {
    /// Create a new state machine in the Pending state.
    pub fn new() -> Self {
        Self::Pending
    }

    /// Process an event and return the new state plus actions to execute.
    pub fn on_event(self, event: DeployEvent) -> (Self, Vec<DeployAction>) {
        match (self, event) {
            // From Pending
            (
                Self::Pending,
                DeployEvent::Created {
                    deployment_id,
                    policy,
                },
            ) => (
                Self::InProgress {
                    deployment_id,
                    polls: 0,
                    policy,
                },
                vec![DeployAction::UploadRequired],
            ),

            // From InProgress
            (
                Self::InProgress {
                    deployment_id,
                    polls,
                    policy,
                },
                DeployEvent::UploadsFinished,
            ) => (
                Self::InProgress {
                    deployment_id,
                    polls,
                    policy,
                },
                vec![DeployAction::Poll {
                    delay: policy.interval,
                }],
            ),
            (
                Self::InProgress { deployment_id, .. },
                DeployEvent::StatusReported(RemoteStatus::Ready { url }),
            ) => (
                Self::Completed {
                    deployment_id,
                    url: url.clone(),
                },
                vec![DeployAction::Finish { url }],
            ),
            (
                Self::InProgress { .. },
                DeployEvent::StatusReported(RemoteStatus::Error { message }),
            ) => fail(format!("provider reported an error: {}", message)),
            (
                Self::InProgress {
                    deployment_id,
                    polls,
                    policy,
                },
                DeployEvent::StatusReported(RemoteStatus::Processing),
            ) => {
                let polls = polls.saturating_add(1);
                if polls >= policy.max_polls {
                    return fail(format!("deployment not ready after {} polls", polls));
                }
                (
                    Self::InProgress {
                        deployment_id,
                        polls,
                        policy,
                    },
                    vec![DeployAction::Poll {
                        delay: policy.interval,
                    }],
                )
            }

            // Any non-terminal state
            (Self::Pending | Self::InProgress { .. }, DeployEvent::Failed { reason }) => {
                fail(reason)
            }

            // Terminal states and invalid transitions - stay put
            (state, _) => (state, vec![]),
        }
    }

    /// Whether no further transitions are possible.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed { .. } | Self::Failed { .. })
    }

    /// Lowercase name, as shown to users.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress { .. } => "in_progress",
            Self::Completed { .. } => "completed",
            Self::Failed { .. } => "failed",
        }
    }
}

impl Default for DeployState {
    fn default() -> Self {
        Self::new()
    }
}

fn fail(reason: String) -> (DeployState, Vec<DeployAction>) {
    (
        DeployState::Failed {
            reason: reason.clone(),
        },
        vec![DeployAction::Abort { reason }],
    )
}
