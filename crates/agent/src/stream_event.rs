//! Events emitted by the orchestrator during a chat turn.
//!
//! Each event serializes to one JSON object; the gateway writes them as
//! newline-delimited JSON:
//! - `token`:     a piece of answer text
//! - `component`: a UI component, used for tool progress (`json` type)

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OrchestratorEvent {
    Token { content: String },

    Component { component: UiComponent },
}

/// Component vocabulary understood by the chat frontend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ComponentKind {
    Text,
    Markdown,
    RiskCard,
    BomTree,
    SupplierTable,
    Json,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UiComponent {
    #[serde(rename = "type")]
    pub kind: ComponentKind,

    pub title: String,

    /// Correlates the started/completed pair of one invocation.
    pub id: String,

    pub data: serde_json::Value,
}

impl OrchestratorEvent {
    pub fn token(content: impl Into<String>) -> Self {
        Self::Token {
            content: content.into(),
        }
    }

    pub fn tool_started(tool: &str, id: &str, input: serde_json::Value) -> Self {
        Self::Component {
            component: UiComponent {
                kind: ComponentKind::Json,
                title: format!("Executing: {tool}"),
                id: id.to_string(),
                data: serde_json::json!({
                    "tool": tool,
                    "input": input,
                    "status": "started",
                }),
            },
        }
    }

    pub fn tool_completed(tool: &str, id: &str, output: serde_json::Value) -> Self {
        Self::Component {
            component: UiComponent {
                kind: ComponentKind::Json,
                title: format!("Completed: {tool}"),
                id: id.to_string(),
                data: serde_json::json!({
                    "tool": tool,
                    "output": output,
                    "status": "completed",
                }),
            },
        }
    }

    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Token { .. } => "token",
            Self::Component { .. } => "component",
        }
    }

    /// One NDJSON line, newline included.
    pub fn to_ndjson_line(&self) -> String {
        let mut line = serde_json::to_string(self).unwrap_or_else(|e| {
            serde_json::json!({ "type": "token", "content": format!("\nError: {e}") }).to_string()
        });
        line.push('\n');
        line
    }
}
