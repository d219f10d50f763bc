//! `agentmesh chat`: Send a message and render the event stream.

use agentmesh_agent::OrchestratorEvent;
use agentmesh_config::AppConfig;
use anyhow::Context;
use futures::StreamExt;
use std::io::Write;

pub async fn run(config: AppConfig, message: &str, url: Option<String>) -> anyhow::Result<()> {
    let base = super::orchestrator_url(&config, url);

    let response = reqwest::Client::new()
        .post(format!("{base}/chat"))
        .json(&serde_json::json!({ "message": message }))
        .send()
        .await
        .with_context(|| format!("Orchestrator unreachable at {base}"))?
        .error_for_status()?;

    let mut bytes = response.bytes_stream();
    let mut lines = LineBuffer::default();
    let mut stdout = std::io::stdout();

    while let Some(chunk) = bytes.next().await {
        let chunk = chunk.context("Chat stream interrupted")?;
        for line in lines.push(&String::from_utf8_lossy(&chunk)) {
            print_line(&mut stdout, &line)?;
        }
    }
    if let Some(line) = lines.finish() {
        print_line(&mut stdout, &line)?;
    }
    writeln!(stdout)?;

    Ok(())
}

fn print_line(out: &mut impl Write, line: &str) -> anyhow::Result<()> {
    match serde_json::from_str::<OrchestratorEvent>(line) {
        Ok(event) => write!(out, "{}", render(&event))?,
        Err(e) => tracing::debug!(error = %e, line, "Skipping unrecognized event"),
    }
    out.flush()?;
    Ok(())
}

/// Tokens print inline; tool progress gets its own line.
fn render(event: &OrchestratorEvent) -> String {
    match event {
        OrchestratorEvent::Token { content } => content.clone(),
        OrchestratorEvent::Component { component } => {
            let detail = match component.data["status"].as_str() {
                Some("started") => component.data["input"].to_string(),
                _ => component.data["output"].to_string(),
            };
            format!("\n[{}] {}\n", component.title, detail)
        }
    }
}

/// Splits a byte stream into complete NDJSON lines.
#[derive(Default)]
struct LineBuffer {
    pending: String,
}

impl LineBuffer {
    fn push(&mut self, text: &str) -> Vec<String> {
        self.pending.push_str(text);
        let mut out = Vec::new();
        while let Some(end) = self.pending.find('\n') {
            let line: String = self.pending.drain(..=end).collect();
            let line = line.trim();
            if !line.is_empty() {
                out.push(line.to_string());
            }
        }
        out
    }

    fn finish(&mut self) -> Option<String> {
        let rest = std::mem::take(&mut self.pending);
        let rest = rest.trim();
        (!rest.is_empty()).then(|| rest.to_string())
    }
}
