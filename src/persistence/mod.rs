//! Persistence layer for projects and agents
//!
//! Handlers talk to the [`DocumentStore`] trait only:
//! - `PostgresStore` (in `adapters`) is the production implementation
//! - [`MemoryStore`] backs tests and `serve --ephemeral`
//! - [`seed`] fills an empty agent collection at boot

pub mod memory;
pub mod seed;

use async_trait::async_trait;
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::domain::{Agent, AgentDraft, AgentPatch, AgentStatusPing, Project, ProjectDraft};
use crate::error::Result;

pub use memory::MemoryStore;
pub use seed::{default_agents, seed_default_agents};

/// Per-status document counts, keyed by the wire name of the status
pub type StatusCounts = BTreeMap<String, i64>;

/// CRUD surface of the primary document store
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Cheap connectivity probe
    async fn ping(&self) -> Result<()>;

    // ==================== Projects ====================

    /// All projects, newest first
    async fn list_projects(&self) -> Result<Vec<Project>>;

    async fn insert_project(&self, draft: ProjectDraft) -> Result<Project>;

    async fn get_project(&self, id: Uuid) -> Result<Option<Project>>;

    /// Replace every editable field; `None` when the id is unknown
    async fn replace_project(&self, id: Uuid, draft: ProjectDraft) -> Result<Option<Project>>;

    /// Remove a project and return it; `None` when the id is unknown
    async fn delete_project(&self, id: Uuid) -> Result<Option<Project>>;

    async fn project_status_counts(&self) -> Result<StatusCounts>;

    // ==================== Agents ====================

    /// All agents ordered by `agentId`
    async fn list_agents(&self) -> Result<Vec<Agent>>;

    /// Insert a new agent; a duplicate `agentId` is a `Conflict`
    async fn insert_agent(&self, draft: AgentDraft) -> Result<Agent>;

    /// Insert several agents at once, returning how many were written
    async fn insert_agents(&self, drafts: Vec<AgentDraft>) -> Result<usize>;

    /// Partial update; always refreshes `lastSeen`
    async fn update_agent(&self, id: Uuid, patch: AgentPatch) -> Result<Option<Agent>>;

    async fn delete_agent(&self, id: Uuid) -> Result<Option<Agent>>;

    /// Create-or-update by `agentId` from a presence ping (last write wins)
    async fn upsert_agent_status(&self, ping: &AgentStatusPing) -> Result<Agent>;

    async fn count_agents(&self) -> Result<i64>;

    async fn agent_status_counts(&self) -> Result<StatusCounts>;
}
