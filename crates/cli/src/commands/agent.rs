//! `agentmesh agent`: Serve a card's skills and register with the orchestrator.
//!
//! Every declared skill is answered by an echo handler, which is enough to
//! exercise routing end to end without domain services.

use agentmesh_config::AppConfig;
use agentmesh_core::AgentCard;
use agentmesh_gateway::SkillHost;
use agentmesh_registry::RegistrationClient;
use anyhow::Context;
use std::path::Path;

pub async fn run(config: AppConfig, card_path: &Path, port_override: Option<u16>) -> anyhow::Result<()> {
    let card = read_card(card_path)?;
    let port = listen_port(port_override, &card, config.server.port);
    let addr = format!("{}:{}", config.server.host, port);

    println!("agentmesh agent: {}", card.name);
    println!("   Listening:    {addr}");
    println!("   Skills:       {}", card.skill_ids().join(", "));
    println!("   Orchestrator: {}", config.registration.orchestrator_url);

    let registration = RegistrationClient::from_config(&config.registration);
    SkillHost::new(card)
        .echo_unhandled()
        .serve(&addr, Some(registration))
        .await
        .with_context(|| format!("Skill host failed on {addr}"))
}

fn read_card(path: &Path) -> anyhow::Result<AgentCard> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read agent card {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Invalid agent card {}", path.display()))
}

/// `--port` or `PORT`, then the card's advertised port, then the config.
fn listen_port(explicit: Option<u16>, card: &AgentCard, configured: u16) -> u16 {
    explicit.or_else(|| card_port(card)).unwrap_or(configured)
}

/// The explicit port in the card's advertised URL, if any.
fn card_port(card: &AgentCard) -> Option<u16> {
    reqwest::Url::parse(&card.url).ok()?.port()
}
