//! The orchestrator agent: a tool-calling loop over the live registry.
//!
//! Tools are not fixed at construction. Every turn snapshots the registry,
//! so an agent that registers mid-session is routable from the next
//! message on.

use agentmesh_config::AppConfig;
use agentmesh_core::message::{Conversation, Message, MessageToolCall};
use agentmesh_core::provider::{Provider, ProviderRequest};
use agentmesh_core::tool::{ToolCall, ToolRegistry};
use agentmesh_registry::Registry;
use agentmesh_tools::build_toolset;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::strategy::build_strategy_prompt;
use crate::stream_event::OrchestratorEvent;

pub const WAITING_MESSAGE: &str = "System is initializing. No agents registered yet. Please wait.";

pub const MAX_ITERATIONS_MESSAGE: &str =
    "I've reached the maximum number of reasoning iterations. Here's what I found so far.";

const DEFAULT_PERSONA: &str = "You are a smart Orchestrator Agent for a supply chain system.";

/// Routes user questions to registered skills through an LLM.
pub struct OrchestratorAgent {
    provider: Arc<dyn Provider>,
    registry: Arc<Registry>,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
    persona: String,
    max_iterations: u32,
    tool_timeout: Duration,
    http: reqwest::Client,
}

/// The event consumer went away.
struct Disconnected;

impl OrchestratorAgent {
    pub fn new(provider: Arc<dyn Provider>, registry: Arc<Registry>, model: impl Into<String>) -> Self {
        Self {
            provider,
            registry,
            model: model.into(),
            temperature: 0.0,
            max_tokens: None,
            persona: DEFAULT_PERSONA.into(),
            max_iterations: 10,
            tool_timeout: Duration::from_secs(30),
            http: reqwest::Client::new(),
        }
    }

    pub fn from_config(provider: Arc<dyn Provider>, registry: Arc<Registry>, config: &AppConfig) -> Self {
        let agent = Self::new(provider, registry, config.provider.model.clone())
            .with_temperature(config.provider.temperature)
            .with_persona(config.orchestrator.persona.clone())
            .with_max_iterations(config.orchestrator.max_iterations)
            .with_tool_timeout(config.orchestrator.tool_timeout());
        match config.provider.max_tokens {
            Some(max) => agent.with_max_tokens(max),
            None => agent,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    /// First line of the system prompt.
    pub fn with_persona(mut self, persona: impl Into<String>) -> Self {
        self.persona = persona.into();
        self
    }

    pub fn with_max_iterations(mut self, max: u32) -> Self {
        self.max_iterations = max.max(1);
        self
    }

    pub fn with_tool_timeout(mut self, timeout: Duration) -> Self {
        self.tool_timeout = timeout;
        self
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Run one chat turn in a background task.
    ///
    /// The returned receiver yields events as the loop progresses and closes
    /// when the turn is over. Dropping it cancels the turn at the next event.
    pub fn run_stream(&self, user_message: &str) -> mpsc::Receiver<OrchestratorEvent> {
        let (tx, rx) = mpsc::channel::<OrchestratorEvent>(128);

        let turn = Turn {
            provider: self.provider.clone(),
            model: self.model.clone(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            max_iterations: self.max_iterations,
            cards: self.registry.list_agents(),
            persona: self.persona.clone(),
            tool_timeout: self.tool_timeout,
            http: self.http.clone(),
            tx,
        };
        let user_message = user_message.to_string();

        tokio::spawn(async move {
            if turn.run(user_message).await.is_err() {
                debug!("Chat consumer disconnected, turn abandoned");
            }
        });

        rx
    }
}

/// Everything one turn needs, moved into its task.
struct Turn {
    provider: Arc<dyn Provider>,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
    max_iterations: u32,
    cards: Vec<agentmesh_core::AgentCard>,
    persona: String,
    tool_timeout: Duration,
    http: reqwest::Client,
    tx: mpsc::Sender<OrchestratorEvent>,
}

impl Turn {
    async fn emit(&self, event: OrchestratorEvent) -> Result<(), Disconnected> {
        self.tx.send(event).await.map_err(|_| Disconnected)
    }

    async fn run(self, user_message: String) -> Result<(), Disconnected> {
        let tools = build_toolset(&self.cards, &self.http, self.tool_timeout);
        if tools.is_empty() {
            info!(agents = self.cards.len(), "Chat received with no skills registered");
            return self.emit(OrchestratorEvent::token(WAITING_MESSAGE)).await;
        }

        let tool_defs = tools.definitions();

        let mut conv = Conversation::new();
        conv.push(Message::system(build_strategy_prompt(&self.persona, &self.cards)));
        conv.push(Message::user(user_message));

        for iteration in 1..=self.max_iterations {
            let request = ProviderRequest {
                model: self.model.clone(),
                messages: conv.messages.clone(),
                temperature: self.temperature,
                max_tokens: self.max_tokens,
                tools: tool_defs.clone(),
                stream: true,
            };

            let Some((content, tool_calls)) = self.stream_completion(request).await? else {
                return Ok(());
            };

            if tool_calls.is_empty() {
                info!(iteration, conversation = %conv.id, "Turn answered");
                return Ok(());
            }

            let mut assistant = Message::assistant(content);
            assistant.tool_calls = tool_calls.clone();
            conv.push(assistant);

            for tc in &tool_calls {
                let observation = self.invoke(&tools, tc).await?;
                conv.push(Message::tool_result(&tc.id, observation));
            }
        }

        warn!(max_iterations = self.max_iterations, "Orchestrator hit max iterations");
        self.emit(OrchestratorEvent::token(MAX_ITERATIONS_MESSAGE)).await
    }

    /// Stream one LLM call, forwarding content as tokens.
    ///
    /// Returns `None` when the provider failed; the error token has already
    /// been emitted and the turn must end.
    async fn stream_completion(
        &self,
        request: ProviderRequest,
    ) -> Result<Option<(String, Vec<MessageToolCall>)>, Disconnected> {
        let mut stream = match self.provider.stream(request).await {
            Ok(rx) => rx,
            Err(e) => {
                warn!(provider = %self.provider.name(), error = %e, "Provider request failed");
                self.emit(OrchestratorEvent::token(format!("\nError: {e}"))).await?;
                return Ok(None);
            }
        };

        let mut content = String::new();
        let mut tool_calls: Vec<MessageToolCall> = Vec::new();

        while let Some(next) = stream.recv().await {
            let chunk = match next {
                Ok(chunk) => chunk,
                Err(e) => {
                    warn!(provider = %self.provider.name(), error = %e, "Provider stream failed");
                    self.emit(OrchestratorEvent::token(format!("\nError: {e}"))).await?;
                    return Ok(None);
                }
            };

            if let Some(text) = chunk.content.filter(|t| !t.is_empty()) {
                content.push_str(&text);
                self.emit(OrchestratorEvent::token(text)).await?;
            }

            // Chunks carry complete calls. Ids must be unique to link results.
            for mut tc in chunk.tool_calls {
                if tc.id.is_empty() || tool_calls.iter().any(|t| t.id == tc.id) {
                    tc.id = format!("call_{}", Uuid::new_v4().simple());
                }
                tool_calls.push(tc);
            }
        }

        Ok(Some((content, tool_calls)))
    }

    /// Invoke one tool call between its started/completed events and
    /// return the observation for the LLM.
    async fn invoke(&self, tools: &ToolRegistry, tc: &MessageToolCall) -> Result<String, Disconnected> {
        let arguments: serde_json::Value =
            serde_json::from_str(&tc.arguments).unwrap_or_else(|_| serde_json::json!({}));
        let run_id = Uuid::new_v4().to_string();

        self.emit(OrchestratorEvent::tool_started(&tc.name, &run_id, arguments.clone()))
            .await?;

        let call = ToolCall {
            id: tc.id.clone(),
            name: tc.name.clone(),
            arguments,
        };

        let result = tokio::select! {
            result = tools.execute(&call) => result,
            _ = self.tx.closed() => return Err(Disconnected),
        };

        let (display, observation) = match result {
            Ok(result) => (result.display_value(), result.output),
            Err(e) => {
                let message = format!("Error: {e}");
                warn!(tool = %tc.name, error = %e, "Tool invocation failed");
                (serde_json::Value::String(message.clone()), message)
            }
        };

        self.emit(OrchestratorEvent::tool_completed(&tc.name, &run_id, display))
            .await?;
        Ok(observation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream_event::UiComponent;
    use crate::test_helpers::*;
    use axum::{Json, Router, extract::ConnectInfo, routing::post};

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        format!("http://{addr}")
    }

    async fn materials_agent() -> String {
        serve(Router::new().route(
            "/find-material",
            post(|Json(body): Json<serde_json::Value>| async move {
                Json(serde_json::json!({ "part": body["part_name"], "material": "Forged aluminium" }))
            }),
        ))
        .await
    }

    async fn collect(mut rx: mpsc::Receiver<OrchestratorEvent>) -> Vec<OrchestratorEvent> {
        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        events
    }

    fn components(events: &[OrchestratorEvent]) -> Vec<&UiComponent> {
        events
            .iter()
            .filter_map(|e| match e {
                OrchestratorEvent::Component { component } => Some(component),
                _ => None,
            })
            .collect()
    }

    fn tokens(events: &[OrchestratorEvent]) -> String {
        events
            .iter()
            .filter_map(|e| match e {
                OrchestratorEvent::Token { content } => Some(content.as_str()),
                _ => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn empty_registry_emits_single_waiting_token() {
        let provider = Arc::new(SequentialMockProvider::new(vec![]));
        let agent = OrchestratorAgent::new(provider.clone(), Arc::new(Registry::new()), "mock-model");

        let events = collect(agent.run_stream("Find details for Piston Assembly")).await;
        assert_eq!(events, vec![OrchestratorEvent::token(WAITING_MESSAGE)]);
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn routes_to_skill_then_answers() {
        let url = materials_agent().await;
        let registry = Arc::new(Registry::new());
        registry.register(part_card("materials-agent", &url, "find-material", Some("use for parts")));

        let provider = Arc::new(SequentialMockProvider::tool_then_answer(
            vec![make_tool_call("find-material", serde_json::json!({ "part_name": "Piston Assembly" }))],
            "The Piston Assembly is forged aluminium.",
        ));
        let agent = OrchestratorAgent::new(provider.clone(), registry, "mock-model");

        let events = collect(agent.run_stream("Find details for Piston Assembly")).await;
        let comps = components(&events);
        assert_eq!(comps.len(), 2);
        assert_eq!(comps[0].title, "Executing: find-material");
        assert_eq!(comps[0].data["input"]["part_name"], "Piston Assembly");
        assert_eq!(comps[1].title, "Completed: find-material");
        assert_eq!(comps[0].id, comps[1].id);
        assert_eq!(comps[1].data["output"]["material"], "Forged aluminium");
        assert_eq!(tokens(&events), "The Piston Assembly is forged aluminium.");
        assert!(matches!(events.last(), Some(OrchestratorEvent::Token { .. })));

        // The observation is fed back to the LLM on the second call.
        let requests = provider.requests();
        assert_eq!(requests.len(), 2);
        let last = requests[1].messages.last().unwrap();
        assert_eq!(last.tool_call_id.as_deref(), Some("call_find-material"));
        assert!(last.content.contains("Forged aluminium"));
    }

    #[tokio::test]
    async fn request_carries_strategy_and_tools() {
        let registry = Arc::new(Registry::new());
        registry.register(part_card("bom-agent", "http://127.0.0.1:9", "get-bom", Some("try this first for composition queries")));
        registry.register(part_card("materials-agent", "http://127.0.0.1:9", "find-material", None));

        let provider = Arc::new(SequentialMockProvider::new(vec![make_text_response("ok")]));
        let agent = OrchestratorAgent::new(provider.clone(), registry, "mock-model")
            .with_persona("You route questions.");
        collect(agent.run_stream("hi")).await;

        let request = &provider.requests()[0];
        assert!(request.stream);
        assert!(request.messages[0].content.starts_with("You route questions.\n\n"));
        assert!(request.messages[0].content.contains("- try this first for composition queries"));
        let names: Vec<_> = request.tools.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["get-bom", "find-material"]);
    }

    #[tokio::test]
    async fn unknown_tool_is_observed_as_error() {
        let registry = Arc::new(Registry::new());
        registry.register(part_card("bom-agent", "http://127.0.0.1:9", "get-bom", None));

        let provider = Arc::new(SequentialMockProvider::tool_then_answer(
            vec![make_tool_call("ghost-skill", serde_json::json!({}))],
            "Sorry.",
        ));
        let agent = OrchestratorAgent::new(provider.clone(), registry, "mock-model");

        let events = collect(agent.run_stream("hi")).await;
        let comps = components(&events);
        assert_eq!(comps.len(), 2);
        assert_eq!(comps[1].data["output"], "Error: Tool not found: ghost-skill");
        assert_eq!(
            provider.requests()[1].messages.last().unwrap().content,
            "Error: Tool not found: ghost-skill"
        );
    }

    #[tokio::test]
    async fn unreachable_agent_does_not_abort_turn() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let registry = Arc::new(Registry::new());
        registry.register(part_card("bom-agent", &format!("http://{addr}"), "get-bom", None));
        let provider = Arc::new(SequentialMockProvider::tool_then_answer(
            vec![make_tool_call("get-bom", serde_json::json!({ "part_name": "V6 Engine" }))],
            "The BOM service is unavailable.",
        ));
        let agent = OrchestratorAgent::new(provider, registry, "mock-model");

        let events = collect(agent.run_stream("BOM for V6 Engine")).await;
        let comps = components(&events);
        let output = comps[1].data["output"].as_str().unwrap();
        assert!(output.starts_with("Error calling get-bom: "));
        assert_eq!(tokens(&events), "The BOM service is unavailable.");
    }

    #[tokio::test]
    async fn malformed_arguments_become_empty_object() {
        let registry = Arc::new(Registry::new());
        registry.register(part_card("bom-agent", "http://127.0.0.1:9", "get-bom", None));
        let mut call = make_tool_call("get-bom", serde_json::json!({}));
        call.arguments = "{not json".into();
        let provider = Arc::new(SequentialMockProvider::tool_then_answer(vec![call], "done"));
        let agent = OrchestratorAgent::new(provider, registry, "mock-model");

        let events = collect(agent.run_stream("hi")).await;
        let comps = components(&events);
        assert_eq!(comps[0].data["input"], serde_json::json!({}));
        assert!(comps[1].data["output"]
            .as_str()
            .unwrap()
            .contains("missing required argument 'part_name'"));
    }

    #[tokio::test]
    async fn started_precedes_completed_for_every_call() {
        let url = materials_agent().await;
        let registry = Arc::new(Registry::new());
        registry.register(part_card("materials-agent", &url, "find-material", None));
        let provider = Arc::new(SequentialMockProvider::tool_then_answer(
            vec![
                make_tool_call("find-material", serde_json::json!({ "part_name": "Piston" })),
                MessageToolCall {
                    id: "call_2".into(),
                    name: "find-material".into(),
                    arguments: r#"{"part_name":"Crankshaft"}"#.into(),
                },
            ],
            "done",
        ));
        let agent = OrchestratorAgent::new(provider, registry, "mock-model");

        let events = collect(agent.run_stream("hi")).await;
        let comps = components(&events);
        assert_eq!(comps.len(), 4);
        for pair in comps.chunks(2) {
            assert_eq!(pair[0].data["status"], "started");
            assert_eq!(pair[1].data["status"], "completed");
            assert_eq!(pair[0].id, pair[1].id);
        }
        assert_ne!(comps[0].id, comps[2].id);
    }

    #[tokio::test]
    async fn calls_sharing_an_id_run_separately() {
        let url = materials_agent().await;
        let registry = Arc::new(Registry::new());
        registry.register(part_card("materials-agent", &url, "find-material", None));
        let unnamed = |part: &str| MessageToolCall {
            id: String::new(),
            name: "find-material".into(),
            arguments: serde_json::json!({ "part_name": part }).to_string(),
        };
        let provider = Arc::new(SequentialMockProvider::tool_then_answer(
            vec![
                unnamed("Piston"),
                unnamed("Crankshaft"),
                make_tool_call("find-material", serde_json::json!({ "part_name": "Camshaft" })),
                make_tool_call("find-material", serde_json::json!({ "part_name": "Valve" })),
            ],
            "done",
        ));
        let agent = OrchestratorAgent::new(provider.clone(), registry, "mock-model");

        let events = collect(agent.run_stream("hi")).await;
        let comps = components(&events);
        assert_eq!(comps.len(), 8);
        let inputs: Vec<_> = comps
            .iter()
            .filter(|c| c.data["status"] == "started")
            .map(|c| c.data["input"]["part_name"].as_str().unwrap())
            .collect();
        assert_eq!(inputs, vec!["Piston", "Crankshaft", "Camshaft", "Valve"]);
        for completed in comps.iter().filter(|c| c.data["status"] == "completed") {
            assert_eq!(completed.data["output"]["material"], "Forged aluminium");
        }

        // Each result links back to exactly one distinct call.
        let second = &provider.requests()[1];
        let assistant = &second.messages[2];
        let call_ids: Vec<_> = assistant.tool_calls.iter().map(|t| t.id.clone()).collect();
        assert_eq!(call_ids.len(), 4);
        assert!(call_ids.iter().all(|id| !id.is_empty()));
        assert_eq!(call_ids[2], "call_find-material");
        let mut unique = call_ids.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), 4);
        let result_ids: Vec<_> = second.messages[3..]
            .iter()
            .map(|m| m.tool_call_id.clone().unwrap())
            .collect();
        assert_eq!(result_ids, call_ids);
    }

    #[tokio::test]
    async fn skill_less_cards_get_waiting_token() {
        let registry = Arc::new(Registry::new());
        let idle: agentmesh_core::AgentCard = serde_json::from_value(serde_json::json!({
            "name": "idle-agent",
            "description": "No skills yet",
            "url": "http://127.0.0.1:9",
            "skills": []
        }))
        .unwrap();
        registry.register(idle);
        let provider = Arc::new(SequentialMockProvider::new(vec![]));
        let agent = OrchestratorAgent::new(provider.clone(), registry, "mock-model");

        let events = collect(agent.run_stream("hi")).await;
        assert_eq!(events, vec![OrchestratorEvent::token(WAITING_MESSAGE)]);
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn turns_reuse_skill_connections() {
        let peers = Arc::new(std::sync::Mutex::new(Vec::new()));
        let recorded = peers.clone();
        let app = Router::new().route(
            "/find-material",
            post(move |ConnectInfo(peer): ConnectInfo<std::net::SocketAddr>| async move {
                recorded.lock().unwrap().push(peer.port());
                Json(serde_json::json!({ "material": "Forged aluminium" }))
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        tokio::spawn(async move {
            axum::serve(listener, app.into_make_service_with_connect_info::<std::net::SocketAddr>())
                .await
                .unwrap()
        });

        let registry = Arc::new(Registry::new());
        registry.register(part_card("materials-agent", &url, "find-material", None));
        let call = || make_tool_call("find-material", serde_json::json!({ "part_name": "Piston" }));
        let provider = Arc::new(SequentialMockProvider::new(vec![
            make_tool_call_response(vec![call()], ""),
            make_text_response("first"),
            make_tool_call_response(vec![call()], ""),
            make_text_response("second"),
        ]));
        let agent = OrchestratorAgent::new(provider, registry, "mock-model");

        collect(agent.run_stream("one")).await;
        collect(agent.run_stream("two")).await;
        let peers = peers.lock().unwrap().clone();
        assert_eq!(peers.len(), 2);
        assert_eq!(peers[0], peers[1]);
    }

    #[tokio::test]
    async fn max_iterations_bounds_the_loop() {
        let url = materials_agent().await;
        let registry = Arc::new(Registry::new());
        registry.register(part_card("materials-agent", &url, "find-material", None));
        let looping = || {
            make_tool_call_response(
                vec![make_tool_call("find-material", serde_json::json!({ "part_name": "Piston" }))],
                "",
            )
        };
        let provider = Arc::new(SequentialMockProvider::new(vec![looping(), looping()]));
        let agent = OrchestratorAgent::new(provider.clone(), registry, "mock-model").with_max_iterations(2);

        let events = collect(agent.run_stream("hi")).await;
        assert_eq!(provider.call_count(), 2);
        assert_eq!(events.last(), Some(&OrchestratorEvent::token(MAX_ITERATIONS_MESSAGE)));
    }

    #[tokio::test]
    async fn provider_failure_emits_one_error_token() {
        let registry = Arc::new(Registry::new());
        registry.register(part_card("bom-agent", "http://127.0.0.1:9", "get-bom", None));
        let provider = Arc::new(InterruptedStreamProvider { chunks: vec!["Look", "ing"] });
        let agent = OrchestratorAgent::new(provider, registry, "mock-model");

        let events = collect(agent.run_stream("hi")).await;
        assert_eq!(
            events,
            vec![
                OrchestratorEvent::token("Look"),
                OrchestratorEvent::token("ing"),
                OrchestratorEvent::token("\nError: Stream interrupted: connection reset"),
            ]
        );
    }

    #[tokio::test]
    async fn dropped_consumer_stops_the_turn() {
        let app = Router::new().route(
            "/find-material",
            post(|| async {
                tokio::time::sleep(Duration::from_millis(300)).await;
                Json(serde_json::json!({}))
            }),
        );
        let url = serve(app).await;
        let registry = Arc::new(Registry::new());
        registry.register(part_card("materials-agent", &url, "find-material", None));
        let provider = Arc::new(SequentialMockProvider::tool_then_answer(
            vec![make_tool_call("find-material", serde_json::json!({ "part_name": "Piston" }))],
            "never sent",
        ));
        let agent = OrchestratorAgent::new(provider.clone(), registry, "mock-model");

        let mut rx = agent.run_stream("hi");
        let first = rx.recv().await.unwrap();
        assert_eq!(first.event_type(), "component");
        drop(rx);

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(provider.call_count(), 1);
    }

    #[test]
    fn from_config_applies_orchestrator_section() {
        let mut config = AppConfig::default();
        config.orchestrator.max_iterations = 3;
        config.orchestrator.tool_timeout_secs = 7;
        config.provider.max_tokens = Some(512);
        let agent = OrchestratorAgent::from_config(
            Arc::new(SequentialMockProvider::new(vec![])),
            Arc::new(Registry::new()),
            &config,
        );
        assert_eq!(agent.max_iterations, 3);
        assert_eq!(agent.tool_timeout, Duration::from_secs(7));
        assert_eq!(agent.max_tokens, Some(512));
        assert_eq!(agent.model, "gpt-4o-mini");
    }
}
