//! Skill host: the HTTP surface every agent exposes.
//!
//! An agent service is its card, one [`SkillHandler`] per declared skill,
//! and a registration client announcing the card to the orchestrator:
//!
//! - `GET /.well-known/agent.json`: abbreviated card
//! - `GET /health`
//! - `POST /{skill_id}`: JSON arguments in, JSON result out

use agentmesh_core::AgentCard;
use agentmesh_registry::RegistrationClient;
use async_trait::async_trait;
use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Domain logic behind one skill.
#[async_trait]
pub trait SkillHandler: Send + Sync {
    async fn handle(&self, arguments: serde_json::Value) -> Result<serde_json::Value, SkillError>;
}

/// A handler failure, returned to the caller as `{"detail": ...}`.
#[derive(Debug, thiserror::Error)]
#[error("{detail}")]
pub struct SkillError {
    pub status: StatusCode,
    pub detail: String,
}

impl SkillError {
    pub fn not_found(detail: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            detail: detail.into(),
        }
    }

    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            detail: detail.into(),
        }
    }

    pub fn internal(detail: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            detail: detail.into(),
        }
    }
}

impl IntoResponse for SkillError {
    fn into_response(self) -> Response {
        (self.status, Json(serde_json::json!({ "detail": self.detail }))).into_response()
    }
}

/// Echoes its arguments back. Used by the demo agent command.
pub struct EchoHandler {
    skill_id: String,
}

impl EchoHandler {
    pub fn new(skill_id: impl Into<String>) -> Self {
        Self {
            skill_id: skill_id.into(),
        }
    }
}

#[async_trait]
impl SkillHandler for EchoHandler {
    async fn handle(&self, arguments: serde_json::Value) -> Result<serde_json::Value, SkillError> {
        if !arguments.is_object() {
            return Err(SkillError::bad_request("Expected a JSON object"));
        }
        Ok(serde_json::json!({
            "skill": self.skill_id,
            "input": arguments,
        }))
    }
}

pub struct SkillHost {
    card: AgentCard,
    handlers: HashMap<String, Arc<dyn SkillHandler>>,
}

type SharedHost = Arc<SkillHost>;

impl SkillHost {
    pub fn new(card: AgentCard) -> Self {
        Self {
            card: card.normalized(),
            handlers: HashMap::new(),
        }
    }

    pub fn with_handler(mut self, skill_id: impl Into<String>, handler: impl SkillHandler + 'static) -> Self {
        self.handlers.insert(skill_id.into(), Arc::new(handler));
        self
    }

    /// Give every declared skill without a handler an [`EchoHandler`].
    pub fn echo_unhandled(mut self) -> Self {
        for id in self.card.skill_ids() {
            if !self.handlers.contains_key(id) {
                self.handlers.insert(id.to_string(), Arc::new(EchoHandler::new(id)));
            }
        }
        self
    }

    pub fn card(&self) -> &AgentCard {
        &self.card
    }

    pub fn router(self) -> Router {
        Router::new()
            .route("/.well-known/agent.json", get(agent_card_handler))
            .route("/health", get(health_handler))
            .route("/{skill_id}", post(skill_handler))
            .layer(tower_http::trace::TraceLayer::new_for_http())
            .with_state(Arc::new(self))
    }

    /// Bind `addr`, start background registration if a client is given,
    /// and serve until the process exits.
    pub async fn serve(self, addr: &str, registration: Option<RegistrationClient>) -> std::io::Result<()> {
        let card = self.card.clone();
        let listener = tokio::net::TcpListener::bind(addr).await?;
        info!(agent = %card.name, addr = %addr, skills = ?card.skill_ids(), "Skill host starting");

        if let Some(client) = registration {
            // Detached: the agent serves whether or not registration succeeds.
            let _ = client.spawn(card);
        }

        axum::serve(listener, self.router()).await
    }
}

async fn agent_card_handler(State(host): State<SharedHost>) -> Json<serde_json::Value> {
    Json(host.card.summary())
}

async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "healthy" }))
}

async fn skill_handler(
    State(host): State<SharedHost>,
    Path(skill_id): Path<String>,
    Json(arguments): Json<serde_json::Value>,
) -> Result<Json<serde_json::Value>, SkillError> {
    let handler = host
        .handlers
        .get(&skill_id)
        .ok_or_else(|| SkillError::not_found(format!("Skill not found: {skill_id}")))?;

    debug!(skill = %skill_id, "Handling skill call");
    handler.handle(arguments).await.map(Json).inspect_err(|e| {
        warn!(skill = %skill_id, status = e.status.as_u16(), detail = %e.detail, "Skill call failed");
    })
}
