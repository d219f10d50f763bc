//! Agent-side registration client.
//!
//! An agent announces its card to the orchestrator's `/register` endpoint
//! from its startup path. The orchestrator may not be up yet, so attempts
//! are retried on a fixed delay up to a bounded count, in a detached task
//! the agent never waits on.

use agentmesh_config::RegistrationConfig;
use agentmesh_core::AgentCard;
use serde::Deserialize;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Bounded fixed-delay retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            delay: Duration::from_secs(5),
        }
    }
}

impl From<&RegistrationConfig> for RetryPolicy {
    fn from(config: &RegistrationConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            delay: config.retry_delay(),
        }
    }
}

/// How a background registration ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationOutcome {
    Registered { attempts: u32 },
    GaveUp { attempts: u32 },
}

/// The orchestrator's acknowledgement body.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterAck {
    pub status: String,
    pub agent: String,
}

#[derive(Debug, thiserror::Error)]
pub enum RegistrationError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Registration rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },
}

#[derive(Debug, Clone)]
pub struct RegistrationClient {
    client: reqwest::Client,
    orchestrator_url: String,
    policy: RetryPolicy,
}

impl RegistrationClient {
    pub fn new(orchestrator_url: impl Into<String>, policy: RetryPolicy) -> Self {
        Self {
            client: reqwest::Client::new(),
            orchestrator_url: orchestrator_url.into().trim_end_matches('/').to_string(),
            policy,
        }
    }

    pub fn from_config(config: &RegistrationConfig) -> Self {
        Self::new(config.orchestrator_url.clone(), RetryPolicy::from(config))
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// A single registration attempt. Only a 200 counts as success.
    pub async fn register_once(&self, card: &AgentCard) -> Result<RegisterAck, RegistrationError> {
        let url = format!("{}/register", self.orchestrator_url);
        let response = self
            .client
            .post(&url)
            .json(card)
            .send()
            .await
            .map_err(|e| RegistrationError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        if status != 200 {
            let body = response.text().await.unwrap_or_default();
            return Err(RegistrationError::Rejected { status, body });
        }

        response
            .json::<RegisterAck>()
            .await
            .map_err(|e| RegistrationError::Network(e.to_string()))
    }

    /// Attempt registration until it succeeds or the policy is exhausted.
    pub async fn register_with_retry(&self, card: &AgentCard) -> RegistrationOutcome {
        let max = self.policy.max_attempts.max(1);
        for attempt in 1..=max {
            match self.register_once(card).await {
                Ok(ack) => {
                    info!(agent = %ack.agent, attempt, "Registered with orchestrator");
                    return RegistrationOutcome::Registered { attempts: attempt };
                }
                Err(e) => {
                    warn!(
                        agent = %card.name,
                        attempt,
                        max_attempts = max,
                        error = %e,
                        "Registration attempt failed"
                    );
                }
            }
            if attempt < max {
                tokio::time::sleep(self.policy.delay).await;
            }
        }

        error!(
            agent = %card.name,
            orchestrator = %self.orchestrator_url,
            "Failed to register with orchestrator after {max} attempts"
        );
        RegistrationOutcome::GaveUp { attempts: max }
    }

    /// Register in a detached task. Callers may drop the handle.
    pub fn spawn(self, card: AgentCard) -> JoinHandle<RegistrationOutcome> {
        tokio::spawn(async move { self.register_with_retry(&card).await })
    }
}
