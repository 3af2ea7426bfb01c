use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{Agent, AgentMessage, AgentStatus, AgentStatusPing, Project};
use crate::persistence::StatusCounts;

// ============================================================================
// Generic Responses
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub success: bool,
    pub error: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResponse {
    pub success: bool,
    pub message: String,
    pub id: Uuid,
}

// ============================================================================
// Messaging Types
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageResponse {
    pub success: bool,
    pub message_id: String,
    pub data: AgentMessage,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageQuery {
    pub agent_id: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagesResponse {
    pub messages: Vec<AgentMessage>,
}

// ============================================================================
// Health & Stats Types
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub database: bool,
    pub vector_store: bool,
    pub uptime_seconds: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionStats {
    pub total: i64,
    pub by_status: StatusCounts,
}

impl CollectionStats {
    pub fn from_counts(by_status: StatusCounts) -> Self {
        Self {
            total: by_status.values().sum(),
            by_status,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryUsage {
    pub resident_bytes: u64,
    pub virtual_bytes: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub database: bool,
    pub vector_store: bool,
    pub projects: CollectionStats,
    pub agents: CollectionStats,
    pub connected_clients: usize,
    pub uptime_seconds: i64,
    pub memory: Option<MemoryUsage>,
    pub timestamp: DateTime<Utc>,
}

// ============================================================================
// WebSocket Types
// ============================================================================

/// Events pushed to connected clients
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum WsMessage {
    ProjectCreated(Project),
    ProjectUpdated(Project),
    ProjectDeleted(DeletedProject),
    AgentRegistered(Agent),
    AgentUpdated(Agent),
    AgentDeleted(DeletedAgent),
    AgentStatusUpdate(AgentStatusUpdate),
    NewMessage(AgentMessage),
}

impl WsMessage {
    pub fn event_name(&self) -> &'static str {
        match self {
            WsMessage::ProjectCreated(_) => "projectCreated",
            WsMessage::ProjectUpdated(_) => "projectUpdated",
            WsMessage::ProjectDeleted(_) => "projectDeleted",
            WsMessage::AgentRegistered(_) => "agentRegistered",
            WsMessage::AgentUpdated(_) => "agentUpdated",
            WsMessage::AgentDeleted(_) => "agentDeleted",
            WsMessage::AgentStatusUpdate(_) => "agentStatusUpdate",
            WsMessage::NewMessage(_) => "newMessage",
        }
    }
}

/// Events accepted from connected clients
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ClientEvent {
    JoinAgent(String),
    AgentStatus(AgentStatusPing),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeletedProject {
    pub id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedAgent {
    pub id: Uuid,
    pub agent_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentStatusUpdate {
    pub agent_id: String,
    pub status: AgentStatus,
    pub current_project: Option<String>,
    pub last_seen: DateTime<Utc>,
}

impl From<&Agent> for AgentStatusUpdate {
    fn from(agent: &Agent) -> Self {
        Self {
            agent_id: agent.agent_id.clone(),
            status: agent.status,
            current_project: agent.current_project.clone(),
            last_seen: agent.last_seen,
        }
    }
}

/// A broadcast event plus the connection that caused it, if any
#[derive(Debug, Clone)]
pub struct Broadcast {
    pub origin: Option<Uuid>,
    pub message: WsMessage,
}
