use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::error::{DeckError, Result};
use crate::validation::{
    normalize_tags, validate_agent_id, validate_name, validate_non_negative,
    validate_percent_f64, validate_port,
};

/// Specialisation of an agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentType {
    Frontend,
    Backend,
    #[default]
    Fullstack,
    Devops,
    Qa,
    Design,
    Orchestration,
}

impl AgentType {
    pub const ALL: [AgentType; 7] = [
        AgentType::Frontend,
        AgentType::Backend,
        AgentType::Fullstack,
        AgentType::Devops,
        AgentType::Qa,
        AgentType::Design,
        AgentType::Orchestration,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AgentType::Frontend => "frontend",
            AgentType::Backend => "backend",
            AgentType::Fullstack => "fullstack",
            AgentType::Devops => "devops",
            AgentType::Qa => "qa",
            AgentType::Design => "design",
            AgentType::Orchestration => "orchestration",
        }
    }
}

impl TryFrom<&str> for AgentType {
    type Error = String;

    fn try_from(s: &str) -> std::result::Result<Self, String> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("Unknown agent type: {}", s))
    }
}

/// Reported availability of an agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentStatus {
    Online,
    #[default]
    Offline,
    Busy,
    Error,
}

impl AgentStatus {
    pub const ALL: [AgentStatus; 4] = [
        AgentStatus::Online,
        AgentStatus::Offline,
        AgentStatus::Busy,
        AgentStatus::Error,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AgentStatus::Online => "online",
            AgentStatus::Offline => "offline",
            AgentStatus::Busy => "busy",
            AgentStatus::Error => "error",
        }
    }
}

impl TryFrom<&str> for AgentStatus {
    type Error = String;

    fn try_from(s: &str) -> std::result::Result<Self, String> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("Unknown agent status: {}", s))
    }
}

impl fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Rolling performance counters of an agent
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Performance {
    #[serde(default)]
    pub tasks_completed: i64,
    #[serde(default)]
    pub average_response_time: f64,
    #[serde(default)]
    pub success_rate: f64,
}

impl Performance {
    fn validate(&self) -> Result<()> {
        if self.tasks_completed < 0 {
            return Err(DeckError::Validation(format!(
                "performance.tasksCompleted cannot be negative: {}",
                self.tasks_completed
            )));
        }
        validate_non_negative(self.average_response_time, "performance.averageResponseTime")?;
        validate_percent_f64(self.success_rate, "performance.successRate")
    }
}

/// A stored agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Agent {
    pub id: Uuid,
    pub agent_id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub agent_type: AgentType,
    pub status: AgentStatus,
    pub port: Option<i32>,
    pub endpoint: Option<String>,
    pub current_project: Option<String>,
    pub capabilities: Vec<String>,
    pub last_seen: DateTime<Utc>,
    pub performance: Performance,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Agent {
    /// Build a stored agent from a validated draft
    pub fn from_draft(id: Uuid, draft: AgentDraft, now: DateTime<Utc>) -> Self {
        Self {
            id,
            agent_id: draft.agent_id,
            name: draft.name,
            agent_type: draft.agent_type,
            status: draft.status,
            port: draft.port,
            endpoint: draft.endpoint,
            current_project: draft.current_project,
            capabilities: draft.capabilities,
            last_seen: now,
            performance: draft.performance,
            created_at: now,
            updated_at: now,
        }
    }

    /// Placeholder record created when a status ping arrives for an unknown agent
    pub fn from_ping(ping: &AgentStatusPing, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            agent_id: ping.agent_id.clone(),
            name: ping.agent_id.clone(),
            agent_type: AgentType::default(),
            status: ping.status,
            port: None,
            endpoint: None,
            current_project: ping.current_project.clone(),
            capabilities: Vec::new(),
            last_seen: now,
            performance: Performance::default(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply a validated patch; `lastSeen` is always refreshed
    pub fn apply_patch(&mut self, patch: AgentPatch, now: DateTime<Utc>) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(agent_type) = patch.agent_type {
            self.agent_type = agent_type;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(port) = patch.port {
            self.port = Some(port);
        }
        if let Some(endpoint) = patch.endpoint {
            self.endpoint = Some(endpoint);
        }
        if let Some(current_project) = patch.current_project {
            self.current_project = Some(current_project);
        }
        if let Some(capabilities) = patch.capabilities {
            self.capabilities = capabilities;
        }
        if let Some(performance) = patch.performance {
            self.performance = performance;
        }
        self.last_seen = now;
        self.updated_at = now;
    }

    /// Apply a status ping (last write wins on status and lastSeen)
    pub fn apply_ping(&mut self, ping: &AgentStatusPing, now: DateTime<Utc>) {
        self.status = ping.status;
        if let Some(ref project) = ping.current_project {
            self.current_project = Some(project.clone());
        }
        self.last_seen = now;
        self.updated_at = now;
    }

    /// Text indexed in the external directory for this agent
    pub fn directory_document(&self) -> String {
        format!(
            "{} ({}) - {} agent with capabilities: {}",
            self.name,
            self.agent_id,
            self.agent_type.as_str(),
            self.capabilities.join(", ")
        )
    }
}

/// Request body for registering an agent
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentInput {
    #[serde(default)]
    pub agent_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub agent_type: Option<AgentType>,
    #[serde(default)]
    pub status: AgentStatus,
    #[serde(default)]
    pub port: Option<i32>,
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub current_project: Option<String>,
    #[serde(default)]
    pub capabilities: Vec<String>,
    #[serde(default)]
    pub performance: Performance,
}

/// An agent payload that passed validation
#[derive(Debug, Clone, PartialEq)]
pub struct AgentDraft {
    pub agent_id: String,
    pub name: String,
    pub agent_type: AgentType,
    pub status: AgentStatus,
    pub port: Option<i32>,
    pub endpoint: Option<String>,
    pub current_project: Option<String>,
    pub capabilities: Vec<String>,
    pub performance: Performance,
}

impl AgentInput {
    pub fn validate(self) -> Result<AgentDraft> {
        let agent_id = validate_agent_id(&self.agent_id)?;
        let name = validate_name(&self.name, "name")?;
        let agent_type = self
            .agent_type
            .ok_or_else(|| DeckError::Validation("type is required".to_string()))?;
        if let Some(port) = self.port {
            validate_port(port)?;
        }
        self.performance.validate()?;

        Ok(AgentDraft {
            agent_id,
            name,
            agent_type,
            status: self.status,
            port: self.port,
            endpoint: non_blank(self.endpoint),
            current_project: non_blank(self.current_project),
            capabilities: normalize_tags(self.capabilities),
            performance: self.performance,
        })
    }
}

/// Request body for a partial agent update
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "type", default)]
    pub agent_type: Option<AgentType>,
    #[serde(default)]
    pub status: Option<AgentStatus>,
    #[serde(default)]
    pub port: Option<i32>,
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub current_project: Option<String>,
    #[serde(default)]
    pub capabilities: Option<Vec<String>>,
    #[serde(default)]
    pub performance: Option<Performance>,
}

impl AgentPatch {
    pub fn validate(mut self) -> Result<Self> {
        if let Some(ref name) = self.name {
            self.name = Some(validate_name(name, "name")?);
        }
        if let Some(port) = self.port {
            validate_port(port)?;
        }
        if let Some(ref performance) = self.performance {
            performance.validate()?;
        }
        self.endpoint = non_blank(self.endpoint);
        self.current_project = non_blank(self.current_project);
        self.capabilities = self.capabilities.map(normalize_tags);
        Ok(self)
    }
}

/// Status report pushed by an agent over the presence channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentStatusPing {
    pub agent_id: String,
    pub status: AgentStatus,
    #[serde(default)]
    pub current_project: Option<String>,
}

impl AgentStatusPing {
    pub fn validate(mut self) -> Result<Self> {
        self.agent_id = validate_agent_id(&self.agent_id)?;
        self.current_project = non_blank(self.current_project);
        Ok(self)
    }
}

/// Presence of an agent in the external directory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DirectoryStatus {
    Active,
    Inactive,
}

/// An agent as returned by the list endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentView {
    #[serde(flatten)]
    pub agent: Agent,
    pub directory_status: DirectoryStatus,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
