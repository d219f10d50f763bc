//! A declared skill exposed to the orchestrator as a callable tool.
//!
//! Invocation is `POST {agent.url}/{skill.id}` with the validated argument
//! map as the JSON body. Nothing escapes `execute` as an error: validation
//! failures, network errors, timeouts, non-2xx statuses and non-JSON bodies
//! all come back as a failed `ToolResult` whose text the LLM can read.

use agentmesh_core::error::ToolError;
use agentmesh_core::tool::{Tool, ToolResult};
use agentmesh_core::{AgentCard, AgentSkill};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, warn};

use crate::schema::{ArgValue, SkillSignature};

pub struct RemoteSkillTool {
    skill_id: String,
    agent: String,
    description: String,
    endpoint: String,
    signature: SkillSignature,
    client: reqwest::Client,
    timeout: Duration,
}

impl RemoteSkillTool {
    pub fn new(
        card: &AgentCard,
        skill: &AgentSkill,
        client: reqwest::Client,
        timeout: Duration,
    ) -> Self {
        Self {
            skill_id: skill.id.clone(),
            agent: card.name.clone(),
            description: skill.description.clone(),
            endpoint: card.skill_endpoint(&skill.id),
            signature: SkillSignature::from_parameters(&skill.parameters),
            client,
            timeout,
        }
    }

    /// Name of the agent serving this skill.
    pub fn agent(&self) -> &str {
        &self.agent
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn invoke(&self, arguments: &serde_json::Value) -> Result<serde_json::Value, String> {
        let args = self.signature.validate(arguments).map_err(|e| e.to_string())?;

        debug!(skill = %self.skill_id, endpoint = %self.endpoint, "Invoking remote skill");

        tokio::time::timeout(self.timeout, self.post_json(&args))
            .await
            .map_err(|_| {
                ToolError::Timeout {
                    tool_name: self.skill_id.clone(),
                    timeout_secs: self.timeout.as_secs(),
                }
                .to_string()
            })?
    }

    async fn post_json(
        &self,
        args: &BTreeMap<String, ArgValue>,
    ) -> Result<serde_json::Value, String> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(args)
            .send()
            .await
            .map_err(|e| e.to_string())?;

        let status = response.status();
        let body = response.text().await.map_err(|e| e.to_string())?;
        if !status.is_success() {
            return Err(format!("HTTP {}: {}", status.as_u16(), body));
        }

        serde_json::from_str(&body).map_err(|e| format!("invalid JSON response: {e}"))
    }
}

#[async_trait]
impl Tool for RemoteSkillTool {
    fn name(&self) -> &str {
        &self.skill_id
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameters_schema(&self) -> serde_json::Value {
        self.signature.to_schema()
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        match self.invoke(&arguments).await {
            Ok(data) => Ok(ToolResult {
                call_id: String::new(),
                success: true,
                output: data.to_string(),
                data: Some(data),
            }),
            Err(reason) => {
                warn!(skill = %self.skill_id, agent = %self.agent, %reason, "Skill call failed");
                Ok(ToolResult::failure(
                    String::new(),
                    format!("Error calling {}: {}", self.skill_id, reason),
                ))
            }
        }
    }
}
