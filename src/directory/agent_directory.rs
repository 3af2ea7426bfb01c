use serde_json::{json, Map, Value};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

use super::{ServiceOutcome, VectorQuery, VectorRecord, VectorStore, AGENT_DIRECTORY, MESSAGE_LOG};
use crate::domain::{Agent, AgentMessage};
use crate::error::Result;

/// Upper bound on messages returned by one log query
pub const MAX_MESSAGE_LIMIT: usize = 100;

/// Handle to the external directory and message log
///
/// Constructed once at boot and handed to request handlers through the
/// application state. An instance without a store reports every call as
/// [`ServiceOutcome::Unavailable`].
#[derive(Clone, Default)]
pub struct AgentDirectory {
    store: Option<Arc<dyn VectorStore>>,
}

impl AgentDirectory {
    pub fn new(store: Arc<dyn VectorStore>) -> Self {
        Self { store: Some(store) }
    }

    pub fn unavailable() -> Self {
        Self { store: None }
    }

    pub fn is_available(&self) -> bool {
        self.store.is_some()
    }

    fn outcome<T>(operation: &str, result: Result<T>) -> ServiceOutcome<T> {
        match result {
            Err(e) if e.is_unreachable() => {
                warn!("Vector store unreachable during {}: {}", operation, e);
                ServiceOutcome::Unavailable
            }
            Err(e) => {
                warn!("Vector store {} failed: {}", operation, e);
                ServiceOutcome::Error(e)
            }
            Ok(value) => ServiceOutcome::Ok(value),
        }
    }

    /// Liveness probe of the external service
    pub async fn heartbeat(&self) -> ServiceOutcome<()> {
        let Some(store) = &self.store else {
            return ServiceOutcome::Unavailable;
        };
        Self::outcome("heartbeat", store.heartbeat().await)
    }

    /// Record an agent in the directory keyed by its agentId
    ///
    /// An existing entry for the same agentId is overwritten.
    pub async fn register_agent(&self, agent: &Agent) -> ServiceOutcome<()> {
        let Some(store) = &self.store else {
            return ServiceOutcome::Unavailable;
        };

        let mut metadata = Map::new();
        metadata.insert("agentId".into(), agent.agent_id.clone().into());
        metadata.insert("name".into(), agent.name.clone().into());
        metadata.insert("type".into(), agent.agent_type.as_str().into());
        metadata.insert("status".into(), agent.status.as_str().into());
        metadata.insert("capabilities".into(), agent.capabilities.join(",").into());
        metadata.insert("lastSeen".into(), agent.last_seen.timestamp_millis().into());
        // The service rejects null metadata values.
        if let Some(port) = agent.port {
            metadata.insert("port".into(), port.into());
        }
        if let Some(ref endpoint) = agent.endpoint {
            metadata.insert("endpoint".into(), endpoint.clone().into());
        }

        let record = VectorRecord {
            id: agent.agent_id.clone(),
            document: Some(agent.directory_document()),
            metadata,
        };
        let result = store.upsert(AGENT_DIRECTORY, vec![record]).await;
        if result.is_ok() {
            debug!("Registered agent {} in directory", agent.agent_id);
        }
        Self::outcome("register", result)
    }

    /// Which of the given agentIds have a directory entry
    pub async fn presence(&self, agent_ids: &[String]) -> ServiceOutcome<HashSet<String>> {
        let Some(store) = &self.store else {
            return ServiceOutcome::Unavailable;
        };
        if agent_ids.is_empty() {
            return ServiceOutcome::Ok(HashSet::new());
        }

        let result = store.get(AGENT_DIRECTORY, agent_ids.to_vec()).await;
        Self::outcome("presence lookup", result)
            .map(|records| records.into_iter().map(|r| r.id).collect())
    }

    /// Append a message to the log
    pub async fn append_message(&self, message: &AgentMessage) -> ServiceOutcome<()> {
        let Some(store) = &self.store else {
            return ServiceOutcome::Unavailable;
        };

        let record = VectorRecord {
            id: message.id.clone(),
            document: Some(message.message.clone()),
            metadata: message.metadata(),
        };
        Self::outcome("message append", store.add(MESSAGE_LOG, vec![record]).await)
    }

    /// Messages sent by or to `agent_id` (all messages when `None`)
    pub async fn recent_messages(
        &self,
        agent_id: Option<&str>,
        limit: usize,
    ) -> ServiceOutcome<Vec<AgentMessage>> {
        let Some(store) = &self.store else {
            return ServiceOutcome::Unavailable;
        };

        let query = VectorQuery {
            text: agent_id.unwrap_or("message").to_string(),
            n_results: limit.clamp(1, MAX_MESSAGE_LIMIT),
            filter: agent_id.map(message_filter),
        };
        Self::outcome("message query", store.query(MESSAGE_LOG, query).await).map(|records| {
            records
                .into_iter()
                .map(|r| AgentMessage::from_record(r.id, r.document, &r.metadata))
                .collect()
        })
    }
}

fn message_filter(agent_id: &str) -> Value {
    json!({
        "$or": [
            { "fromAgent": agent_id },
            { "toAgent": agent_id }
        ]
    })
}
