//! Tool adapters for agentmesh.
//!
//! Every skill an agent declares becomes a [`RemoteSkillTool`]: a
//! `Tool` whose arguments are checked against the skill's parameter
//! schema and then POSTed to the agent's skill endpoint. The orchestrator
//! rebuilds the tool set from the registry on every chat turn with
//! [`build_toolset`].

pub mod remote_skill;
pub mod schema;
pub mod toolset;

pub use remote_skill::RemoteSkillTool;
pub use schema::{ArgKind, ArgSpec, ArgValue, SkillSignature};
pub use toolset::build_toolset;
