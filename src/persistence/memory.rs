//! In-process document store
//!
//! Mirrors the PostgreSQL adapter's semantics (ordering, uniqueness,
//! last-write-wins upserts) without a database.

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{DocumentStore, StatusCounts};
use crate::domain::{
    Agent, AgentDraft, AgentPatch, AgentStatus, AgentStatusPing, Project, ProjectDraft,
    ProjectStatus,
};
use crate::error::{DeckError, Result};

#[derive(Default)]
struct Collections {
    /// Newest first
    projects: Vec<Project>,
    /// Ordered by agent_id
    agents: Vec<Agent>,
}

/// Document store held entirely in memory
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Collections>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn duplicate_agent(agent_id: &str) -> DeckError {
    DeckError::Conflict(format!("Agent with agentId '{}' already exists", agent_id))
}

fn insert_sorted(agents: &mut Vec<Agent>, agent: Agent) {
    let pos = agents.partition_point(|a| a.agent_id < agent.agent_id);
    agents.insert(pos, agent);
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn list_projects(&self) -> Result<Vec<Project>> {
        Ok(self.inner.read().await.projects.clone())
    }

    async fn insert_project(&self, draft: ProjectDraft) -> Result<Project> {
        let project = Project::from_draft(Uuid::new_v4(), draft, Utc::now());
        self.inner.write().await.projects.insert(0, project.clone());
        Ok(project)
    }

    async fn get_project(&self, id: Uuid) -> Result<Option<Project>> {
        let inner = self.inner.read().await;
        Ok(inner.projects.iter().find(|p| p.id == id).cloned())
    }

    async fn replace_project(&self, id: Uuid, draft: ProjectDraft) -> Result<Option<Project>> {
        let mut inner = self.inner.write().await;
        let Some(project) = inner.projects.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };
        project.replace_with(draft, Utc::now());
        Ok(Some(project.clone()))
    }

    async fn delete_project(&self, id: Uuid) -> Result<Option<Project>> {
        let mut inner = self.inner.write().await;
        let Some(pos) = inner.projects.iter().position(|p| p.id == id) else {
            return Ok(None);
        };
        Ok(Some(inner.projects.remove(pos)))
    }

    async fn project_status_counts(&self) -> Result<StatusCounts> {
        let inner = self.inner.read().await;
        let mut counts: StatusCounts = ProjectStatus::ALL
            .iter()
            .map(|s| (s.as_str().to_string(), 0))
            .collect();
        for project in &inner.projects {
            *counts.entry(project.status.as_str().to_string()).or_default() += 1;
        }
        Ok(counts)
    }

    async fn list_agents(&self) -> Result<Vec<Agent>> {
        Ok(self.inner.read().await.agents.clone())
    }

    async fn insert_agent(&self, draft: AgentDraft) -> Result<Agent> {
        let mut inner = self.inner.write().await;
        if inner.agents.iter().any(|a| a.agent_id == draft.agent_id) {
            return Err(duplicate_agent(&draft.agent_id));
        }
        let agent = Agent::from_draft(Uuid::new_v4(), draft, Utc::now());
        insert_sorted(&mut inner.agents, agent.clone());
        Ok(agent)
    }

    async fn insert_agents(&self, drafts: Vec<AgentDraft>) -> Result<usize> {
        let mut inner = self.inner.write().await;
        for draft in &drafts {
            if inner.agents.iter().any(|a| a.agent_id == draft.agent_id) {
                return Err(duplicate_agent(&draft.agent_id));
            }
        }
        let now = Utc::now();
        let count = drafts.len();
        for draft in drafts {
            insert_sorted(&mut inner.agents, Agent::from_draft(Uuid::new_v4(), draft, now));
        }
        Ok(count)
    }

    async fn update_agent(&self, id: Uuid, patch: AgentPatch) -> Result<Option<Agent>> {
        let mut inner = self.inner.write().await;
        let Some(agent) = inner.agents.iter_mut().find(|a| a.id == id) else {
            return Ok(None);
        };
        agent.apply_patch(patch, Utc::now());
        Ok(Some(agent.clone()))
    }

    async fn delete_agent(&self, id: Uuid) -> Result<Option<Agent>> {
        let mut inner = self.inner.write().await;
        let Some(pos) = inner.agents.iter().position(|a| a.id == id) else {
            return Ok(None);
        };
        Ok(Some(inner.agents.remove(pos)))
    }

    async fn upsert_agent_status(&self, ping: &AgentStatusPing) -> Result<Agent> {
        let mut inner = self.inner.write().await;
        let now = Utc::now();
        if let Some(agent) = inner.agents.iter_mut().find(|a| a.agent_id == ping.agent_id) {
            agent.apply_ping(ping, now);
            return Ok(agent.clone());
        }
        let agent = Agent::from_ping(ping, now);
        insert_sorted(&mut inner.agents, agent.clone());
        Ok(agent)
    }

    async fn count_agents(&self) -> Result<i64> {
        Ok(self.inner.read().await.agents.len() as i64)
    }

    async fn agent_status_counts(&self) -> Result<StatusCounts> {
        let inner = self.inner.read().await;
        let mut counts: StatusCounts = AgentStatus::ALL
            .iter()
            .map(|s| (s.as_str().to_string(), 0))
            .collect();
        for agent in &inner.agents {
            *counts.entry(agent.status.as_str().to_string()).or_default() += 1;
        }
        Ok(counts)
    }
}
