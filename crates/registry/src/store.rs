//! In-memory agent card store.

use agentmesh_core::{AgentCard, AgentSkill};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::info;

/// Thread-safe store of agent cards keyed by agent name.
///
/// Cards are kept ordered from least to most recently registered; a
/// re-registration replaces the card and moves it to the end.
#[derive(Debug, Default)]
pub struct Registry {
    cards: RwLock<Vec<AgentCard>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite the card for `card.name`.
    pub fn register(&self, card: AgentCard) {
        let card = card.normalized();
        info!(
            agent = %card.name,
            skills = ?card.skill_ids(),
            "Registered agent"
        );

        let mut cards = self.write();
        cards.retain(|c| c.name != card.name);
        cards.push(card);
    }

    /// Point-in-time snapshot, least recently registered first.
    pub fn list_agents(&self) -> Vec<AgentCard> {
        self.read().clone()
    }

    /// Every registered skill, preserving per-card order.
    pub fn all_skills(&self) -> Vec<AgentSkill> {
        self.read()
            .iter()
            .flat_map(|c| c.skills.iter().cloned())
            .collect()
    }

    pub fn agent_names(&self) -> Vec<String> {
        self.read().iter().map(|c| c.name.clone()).collect()
    }

    pub fn get(&self, name: &str) -> Option<AgentCard> {
        self.read().iter().find(|c| c.name == name).cloned()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    // Writes are a single retain + push; a poisoned lock still holds whole cards.
    fn read(&self) -> RwLockReadGuard<'_, Vec<AgentCard>> {
        self.cards.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<AgentCard>> {
        self.cards.write().unwrap_or_else(|e| e.into_inner())
    }
}
