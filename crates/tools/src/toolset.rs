//! Per-turn tool set assembly.

use agentmesh_core::{AgentCard, ToolRegistry};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};

use crate::remote_skill::RemoteSkillTool;

/// Build one tool per declared skill, in card then skill order.
///
/// Cards are expected least recently registered first, so when two agents
/// declare the same skill id the later card's skill wins. Every tool shares
/// `client` and its connection pool.
pub fn build_toolset(cards: &[AgentCard], client: &reqwest::Client, timeout: Duration) -> ToolRegistry {
    let mut tools = ToolRegistry::new();
    let mut owners: HashMap<String, String> = HashMap::new();

    for card in cards {
        for skill in &card.skills {
            let tool = RemoteSkillTool::new(card, skill, client.clone(), timeout);
            if tools.register(Box::new(tool)).is_some() {
                warn!(
                    skill = %skill.id,
                    agent = %card.name,
                    shadowed = owners.get(&skill.id).map(String::as_str).unwrap_or_default(),
                    "Skill id collision, most recent registration wins"
                );
            }
            owners.insert(skill.id.clone(), card.name.clone());
        }
    }

    debug!(tools = ?tools.names(), "Built tool set");
    tools
}
