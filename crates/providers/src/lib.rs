//! LLM provider implementations for agentmesh.
//!
//! All providers implement the `agentmesh_core::Provider` trait. The
//! orchestrator needs a single tool-calling chat endpoint, which any
//! OpenAI-compatible API serves.

pub mod openai_compat;

pub use openai_compat::OpenAiCompatProvider;
