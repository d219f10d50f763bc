//! Strategy prompt assembly.
//!
//! Agents steer the orchestrator through their skills' `instructions`
//! ("try this first for composition queries", ...). Every non-blank hint
//! becomes one bullet under `STRATEGY:` in the system prompt.

use agentmesh_core::AgentCard;

/// Used when no registered skill carries instructions.
pub const STRATEGY_FALLBACK: &str = "Use the available tools to answer user questions.";

pub fn build_strategy_prompt(persona: &str, cards: &[AgentCard]) -> String {
    let hints: Vec<String> = cards
        .iter()
        .flat_map(|card| card.skills.iter())
        .filter_map(|skill| skill.strategy_hint())
        .map(|hint| format!("- {hint}"))
        .collect();

    let strategy = if hints.is_empty() {
        STRATEGY_FALLBACK.to_string()
    } else {
        hints.join("\n")
    };

    format!(
        "{persona}\n\n\
         Your goal is to answer user questions by routing them to the correct tools.\n\n\
         STRATEGY:\n{strategy}\n\n\
         Provide a complete answer based on the user's specific request.\n"
    )
}
