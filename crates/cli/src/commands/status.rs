//! `agentmesh status`: Show the orchestrator's registered agents.

use agentmesh_config::AppConfig;
use anyhow::Context;

pub async fn run(config: AppConfig, url: Option<String>) -> anyhow::Result<()> {
    let base = super::orchestrator_url(&config, url);
    let client = reqwest::Client::new();

    let health: serde_json::Value = client
        .get(format!("{base}/health"))
        .send()
        .await
        .with_context(|| format!("Orchestrator unreachable at {base}"))?
        .error_for_status()?
        .json()
        .await?;

    let agents: serde_json::Value = client
        .get(format!("{base}/agents"))
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    println!("agentmesh status");
    println!("================");
    println!("  Orchestrator: {base}");
    println!("  Health:       {}", health["status"].as_str().unwrap_or("unknown"));

    let cards = agents["agents"].as_array().cloned().unwrap_or_default();
    if cards.is_empty() {
        println!("\n  No agents registered yet");
        return Ok(());
    }

    println!("\n  Agents:");
    for card in &cards {
        println!(
            "    {} ({})",
            card["name"].as_str().unwrap_or("?"),
            card["url"].as_str().unwrap_or("?")
        );
        for skill in card["skills"].as_array().into_iter().flatten() {
            println!("      - {}: {}", skill["id"].as_str().unwrap_or("?"), skill["description"].as_str().unwrap_or(""));
        }
    }

    Ok(())
}
