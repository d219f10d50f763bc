//! Agent registry for agentmesh.
//!
//! The orchestrator side holds a [`Registry`] of agent cards; each agent
//! runs a [`RegistrationClient`] that pushes its card there with retries.

pub mod client;
pub mod store;

pub use client::{RegisterAck, RegistrationClient, RegistrationError, RegistrationOutcome, RetryPolicy};
pub use store::Registry;
