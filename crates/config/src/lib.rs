//! Configuration loading, validation, and management for agentmesh.
//!
//! Loads configuration from `~/.agentmesh/config.toml` with environment
//! variable overrides. Validates all settings at startup. The same file
//! configures the orchestrator and the agents it serves, each reading the
//! sections it needs.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// The root configuration structure.
///
/// Maps directly to `~/.agentmesh/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// LLM provider settings
    #[serde(default)]
    pub provider: ProviderConfig,

    /// HTTP listener settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Decision loop settings
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,

    /// Agent-side registration settings
    #[serde(default)]
    pub registration: RegistrationConfig,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Base URL of an OpenAI-compatible API
    #[serde(default = "default_api_url")]
    pub api_url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default)]
    pub temperature: f32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

fn default_api_url() -> String {
    "https://api.openai.com/v1".into()
}
fn default_model() -> String {
    "gpt-4o-mini".into()
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            api_key: None,
            model: default_model(),
            temperature: 0.0,
            max_tokens: None,
        }
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_url", &self.api_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".into()
}
fn default_port() -> u16 {
    8003
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// First line of the strategy prompt
    #[serde(default = "default_persona")]
    pub persona: String,

    /// Maximum LLM round-trips per chat turn
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    /// Per skill invocation timeout
    #[serde(default = "default_tool_timeout_secs")]
    pub tool_timeout_secs: u64,
}

fn default_persona() -> String {
    "You are a smart Orchestrator Agent for a supply chain system.".into()
}
fn default_max_iterations() -> u32 {
    10
}
fn default_tool_timeout_secs() -> u64 {
    30
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            persona: default_persona(),
            max_iterations: default_max_iterations(),
            tool_timeout_secs: default_tool_timeout_secs(),
        }
    }
}

impl OrchestratorConfig {
    pub fn tool_timeout(&self) -> Duration {
        Duration::from_secs(self.tool_timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrationConfig {
    /// Where agents announce their cards
    #[serde(default = "default_orchestrator_url")]
    pub orchestrator_url: String,

    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_retry_delay_secs")]
    pub retry_delay_secs: u64,
}

fn default_orchestrator_url() -> String {
    "http://localhost:8003".into()
}
fn default_max_attempts() -> u32 {
    10
}
fn default_retry_delay_secs() -> u64 {
    5
}

impl Default for RegistrationConfig {
    fn default() -> Self {
        Self {
            orchestrator_url: default_orchestrator_url(),
            max_attempts: default_max_attempts(),
            retry_delay_secs: default_retry_delay_secs(),
        }
    }
}

impl RegistrationConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.agentmesh/config.toml).
    ///
    /// Environment overrides (highest priority):
    /// - `AGENTMESH_API_KEY`, then `OPENAI_API_KEY`
    /// - `AGENTMESH_API_URL`, `AGENTMESH_MODEL`
    /// - `ORCHESTRATOR_URL`
    /// - `PORT`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from a variable lookup (the process environment in production).
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        if let Some(key) = lookup("AGENTMESH_API_KEY").or_else(|| lookup("OPENAI_API_KEY")) {
            self.provider.api_key = Some(key);
        }
        if let Some(url) = lookup("AGENTMESH_API_URL") {
            self.provider.api_url = url;
        }
        if let Some(model) = lookup("AGENTMESH_MODEL") {
            self.provider.model = model;
        }
        if let Some(url) = lookup("ORCHESTRATOR_URL") {
            self.registration.orchestrator_url = url;
        }
        if let Some(port) = lookup("PORT") {
            self.server.port = port.parse().map_err(|_| {
                ConfigError::ValidationError(format!("PORT must be a port number, got '{port}'"))
            })?;
        }
        Ok(())
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".agentmesh")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.provider.temperature) {
            return Err(ConfigError::ValidationError(
                "provider.temperature must be between 0.0 and 2.0".into(),
            ));
        }
        if self.orchestrator.max_iterations == 0 {
            return Err(ConfigError::ValidationError(
                "orchestrator.max_iterations must be at least 1".into(),
            ));
        }
        if self.registration.max_attempts == 0 {
            return Err(ConfigError::ValidationError(
                "registration.max_attempts must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
