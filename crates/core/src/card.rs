//! Agent Card: the capability manifest an agent announces to the orchestrator.
//!
//! Field names follow the agent-to-agent card format on the wire
//! (`inputModes`, `pushNotifications`, ...), so cards are `camelCase`
//! when serialized.

use serde::{Deserialize, Serialize};

/// One named, schema-described capability an agent offers.
///
/// The `id` doubles as the orchestrator-side tool name and as the URL path
/// segment of the skill endpoint (`POST {agent.url}/{id}`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentSkill {
    pub id: String,

    pub name: String,

    /// Sent to the LLM for tool selection.
    pub description: String,

    #[serde(default = "default_modes")]
    pub input_modes: Vec<String>,

    #[serde(default = "default_modes")]
    pub output_modes: Vec<String>,

    /// JSON Schema object for the skill input.
    pub parameters: serde_json::Value,

    /// Hint for the orchestrator on when/how to use this skill.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
}

fn default_modes() -> Vec<String> {
    vec!["text".into()]
}

impl AgentSkill {
    /// The instructions, if present and not blank.
    pub fn strategy_hint(&self) -> Option<&str> {
        self.instructions
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// Advisory capability flags. Never enforced by the orchestrator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentCapabilities {
    #[serde(default)]
    pub streaming: bool,

    #[serde(default)]
    pub push_notifications: bool,

    #[serde(default)]
    pub state_transition_history: bool,
}

/// The self-described manifest of one agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentCard {
    /// Registry key. Re-registration under the same name overwrites.
    pub name: String,

    pub description: String,

    /// Base address of the agent, without trailing slash.
    pub url: String,

    #[serde(default = "default_version")]
    pub version: String,

    /// Free-text publisher label.
    #[serde(default)]
    pub provider: String,

    #[serde(default)]
    pub capabilities: AgentCapabilities,

    pub skills: Vec<AgentSkill>,

    /// Carried for compatibility; no scheme is enforced.
    #[serde(default = "default_authentication")]
    pub authentication: serde_json::Value,
}

fn default_version() -> String {
    "1.0.0".into()
}

fn default_authentication() -> serde_json::Value {
    serde_json::json!({ "type": "none" })
}

impl AgentCard {
    /// Normalize fields the orchestrator relies on (strips trailing `/` from the url).
    pub fn normalized(mut self) -> Self {
        let trimmed = self.url.trim_end_matches('/').len();
        self.url.truncate(trimmed);
        self
    }

    /// Endpoint of one of this agent's skills.
    pub fn skill_endpoint(&self, skill_id: &str) -> String {
        format!("{}/{}", self.url.trim_end_matches('/'), skill_id)
    }

    /// All skill ids, in declaration order.
    pub fn skill_ids(&self) -> Vec<&str> {
        self.skills.iter().map(|s| s.id.as_str()).collect()
    }

    /// The abbreviated summary served at `/.well-known/agent.json`.
    pub fn summary(&self) -> serde_json::Value {
        serde_json::json!({
            "name": self.name,
            "description": self.description,
            "url": self.url,
            "version": self.version,
            "skills": self
                .skills
                .iter()
                .map(|s| serde_json::json!({ "id": s.id, "name": s.name }))
                .collect::<Vec<_>>(),
        })
    }
}
