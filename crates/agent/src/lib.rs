//! The orchestrator decision loop.
//!
//! One chat turn runs as follows:
//!
//! 1. **Snapshot** the registry; with no agents, answer with a waiting message
//! 2. **Build** one tool per registered skill and a strategy prompt from the
//!    skills' instructions
//! 3. **Stream** an LLM call, forwarding content deltas as `token` events
//! 4. **If tool calls**: invoke each remote skill in order, bracketed by
//!    started/completed `component` events, append the observations, loop to 3
//! 5. **If text only**: the turn is over
//!
//! The loop is bounded by `max_iterations`.

pub mod orchestrator;
pub mod strategy;
pub mod stream_event;

#[cfg(test)]
mod test_helpers;

pub use orchestrator::{MAX_ITERATIONS_MESSAGE, OrchestratorAgent, WAITING_MESSAGE};
pub use strategy::{STRATEGY_FALLBACK, build_strategy_prompt};
pub use stream_event::{ComponentKind, OrchestratorEvent, UiComponent};
