//! `agentmesh orchestrator`: Run the orchestrator service.

use agentmesh_config::AppConfig;

pub async fn run(mut config: AppConfig, port_override: Option<u16>) -> anyhow::Result<()> {
    if let Some(port) = port_override {
        config.server.port = port;
    }

    println!("agentmesh orchestrator");
    println!("   Listening: {}", config.server.bind_addr());
    println!("   Provider:  {} ({})", config.provider.api_url, config.provider.model);
    if config.provider.api_key.is_none() {
        println!("   No API key set (AGENTMESH_API_KEY / OPENAI_API_KEY)");
    }

    agentmesh_gateway::start(config)
        .await
        .map_err(|e| anyhow::anyhow!("Orchestrator failed: {e}"))
}
