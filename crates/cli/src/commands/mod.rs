pub mod agent;
pub mod chat;
pub mod orchestrator;
pub mod status;

use agentmesh_config::AppConfig;
use anyhow::Context;
use std::path::Path;

/// Load config from an explicit path or the default location, then apply
/// environment overrides.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<AppConfig> {
    let Some(path) = path else {
        return AppConfig::load().context("Failed to load config");
    };

    let mut config = AppConfig::load_from(path)
        .with_context(|| format!("Failed to load config from {}", path.display()))?;
    config.apply_env(|key| std::env::var(key).ok())?;
    config.validate()?;
    Ok(config)
}

/// The orchestrator URL to talk to: explicit flag, else the registration target.
pub fn orchestrator_url(config: &AppConfig, flag: Option<String>) -> String {
    flag.unwrap_or_else(|| config.registration.orchestrator_url.clone())
        .trim_end_matches('/')
        .to_string()
}
