//! # agentmesh Core
//!
//! Domain types, traits, and error definitions shared by every agentmesh
//! crate: agent cards and skills, LLM provider abstraction, tool abstraction,
//! and conversation messages.
//!
//! ## Design Philosophy
//!
//! Every seam is a trait here. Implementations live in their respective
//! crates, so the orchestrator loop can be tested with scripted providers
//! and in-process tools.

pub mod card;
pub mod error;
pub mod message;
pub mod provider;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use card::{AgentCapabilities, AgentCard, AgentSkill};
pub use error::{ProviderError, ToolError};
pub use message::{Conversation, Message, MessageToolCall, Role};
pub use provider::{Provider, ProviderRequest, ProviderResponse, StreamChunk, ToolDefinition};
pub use tool::{Tool, ToolCall, ToolRegistry, ToolResult};
