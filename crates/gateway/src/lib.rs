//! HTTP services for agentmesh.
//!
//! The orchestrator service accepts agent registrations and streams chat
//! turns as newline-delimited JSON. Agents are served by [`skill_host`].
//!
//! Built on Axum.

pub mod skill_host;

use agentmesh_agent::OrchestratorAgent;
use agentmesh_config::AppConfig;
use agentmesh_core::{AgentCard, Provider};
use agentmesh_providers::OpenAiCompatProvider;
use agentmesh_registry::Registry;
use axum::{
    Router,
    body::Body,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use serde::Deserialize;
use std::convert::Infallible;
use std::sync::Arc;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::ReceiverStream;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

pub use skill_host::{EchoHandler, SkillError, SkillHandler, SkillHost};

pub const NDJSON_CONTENT_TYPE: &str = "application/x-ndjson";

/// Shared state of the orchestrator service.
pub struct OrchestratorState {
    pub agent: Arc<OrchestratorAgent>,
}

impl OrchestratorState {
    pub fn registry(&self) -> &Registry {
        self.agent.registry()
    }
}

type SharedState = Arc<OrchestratorState>;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

/// Build the orchestrator router.
pub fn build_router(state: SharedState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([axum::http::Method::GET, axum::http::Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/register", post(register_handler))
        .route("/chat", post(chat_handler))
        .route("/health", get(health_handler))
        .route("/agents", get(agents_handler))
        .layer(cors)
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the orchestrator HTTP server.
pub async fn start(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = config.server.bind_addr();

    let provider: Arc<dyn Provider> = Arc::new(OpenAiCompatProvider::from_config(&config.provider));
    let registry = Arc::new(Registry::new());
    let agent = Arc::new(OrchestratorAgent::from_config(provider, registry, &config));
    let app = build_router(Arc::new(OrchestratorState { agent }));

    info!(
        addr = %addr,
        model = %config.provider.model,
        max_iterations = config.orchestrator.max_iterations,
        "Orchestrator starting"
    );
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn register_handler(
    State(state): State<SharedState>,
    Json(card): Json<AgentCard>,
) -> Json<serde_json::Value> {
    let name = card.name.clone();
    state.registry().register(card);
    Json(serde_json::json!({ "status": "registered", "agent": name }))
}

async fn chat_handler(
    State(state): State<SharedState>,
    Json(request): Json<ChatRequest>,
) -> Response {
    let rx = state.agent.run_stream(&request.message);
    let lines = ReceiverStream::new(rx).map(|event| Ok::<_, Infallible>(event.to_ndjson_line()));

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, NDJSON_CONTENT_TYPE)],
        Body::from_stream(lines),
    )
        .into_response()
}

async fn health_handler(State(state): State<SharedState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "agents": state.registry().agent_names(),
    }))
}

async fn agents_handler(State(state): State<SharedState>) -> Json<serde_json::Value> {
    let registry = state.registry();
    Json(serde_json::json!({
        "agents": registry.list_agents(),
        "skills": registry.all_skills(),
    }))
}
