//! Shared test helpers for orchestrator tests.

use agentmesh_core::error::ProviderError;
use agentmesh_core::message::{Message, MessageToolCall};
use agentmesh_core::provider::{Provider, ProviderRequest, ProviderResponse, StreamChunk, Usage};
use agentmesh_core::AgentCard;
use std::sync::Mutex;

/// A mock provider that returns a sequence of scripted responses.
///
/// Each call returns the next response in the queue and records the request.
/// Panics if more calls are made than responses provided.
pub struct SequentialMockProvider {
    responses: Mutex<Vec<ProviderResponse>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl SequentialMockProvider {
    pub fn new(responses: Vec<ProviderResponse>) -> Self {
        Self {
            responses: Mutex::new(responses),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn tool_then_answer(tool_calls: Vec<MessageToolCall>, answer: &str) -> Self {
        Self::new(vec![
            make_tool_call_response(tool_calls, ""),
            make_text_response(answer),
        ])
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Provider for SequentialMockProvider {
    fn name(&self) -> &str {
        "sequential_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let mut requests = self.requests.lock().unwrap();
        let responses = self.responses.lock().unwrap();
        let index = requests.len();
        requests.push(request);

        match responses.get(index) {
            Some(response) => Ok(response.clone()),
            None => panic!(
                "SequentialMockProvider: no more responses (call #{index}, have {})",
                responses.len()
            ),
        }
    }
}

/// Streams a few content chunks, then fails mid-stream.
pub struct InterruptedStreamProvider {
    pub chunks: Vec<&'static str>,
}

#[async_trait::async_trait]
impl Provider for InterruptedStreamProvider {
    fn name(&self) -> &str {
        "interrupted"
    }

    async fn complete(&self, _request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        Err(ProviderError::NotConfigured("stream only".into()))
    }

    async fn stream(
        &self,
        _request: ProviderRequest,
    ) -> Result<tokio::sync::mpsc::Receiver<Result<StreamChunk, ProviderError>>, ProviderError> {
        let (tx, rx) = tokio::sync::mpsc::channel(self.chunks.len() + 1);
        for text in &self.chunks {
            let _ = tx
                .send(Ok(StreamChunk {
                    content: Some(text.to_string()),
                    tool_calls: Vec::new(),
                    done: false,
                    usage: None,
                }))
                .await;
        }
        let _ = tx
            .send(Err(ProviderError::StreamInterrupted("connection reset".into())))
            .await;
        Ok(rx)
    }
}

pub fn make_text_response(text: &str) -> ProviderResponse {
    ProviderResponse {
        message: Message::assistant(text),
        usage: Some(Usage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        }),
        model: "mock-model".into(),
    }
}

pub fn make_tool_call_response(tool_calls: Vec<MessageToolCall>, thought: &str) -> ProviderResponse {
    let mut msg = Message::assistant(thought);
    msg.tool_calls = tool_calls;
    ProviderResponse {
        message: msg,
        usage: None,
        model: "mock-model".into(),
    }
}

pub fn make_tool_call(name: &str, args: serde_json::Value) -> MessageToolCall {
    MessageToolCall {
        id: format!("call_{name}"),
        name: name.to_string(),
        arguments: serde_json::to_string(&args).unwrap(),
    }
}

/// A card with one single-argument (`part_name`) skill.
pub fn part_card(name: &str, url: &str, skill_id: &str, instructions: Option<&str>) -> AgentCard {
    serde_json::from_value(serde_json::json!({
        "name": name,
        "description": format!("{name} service"),
        "url": url,
        "skills": [{
            "id": skill_id,
            "name": skill_id,
            "description": format!("{skill_id} lookup"),
            "parameters": {
                "type": "object",
                "properties": { "part_name": { "type": "string" } },
                "required": ["part_name"]
            },
            "instructions": instructions,
        }]
    }))
    .unwrap()
}
