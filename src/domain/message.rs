use chrono::{DateTime, TimeZone, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::validation::require_text;

const ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const ID_SUFFIX_LEN: usize = 9;

/// Delivery state recorded with every logged message
pub const DELIVERED: &str = "delivered";

/// Generate a message id: `msg_<unix-millis>_<random base36>`
pub fn generate_message_id(now: DateTime<Utc>) -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..ID_SUFFIX_LEN)
        .map(|_| ID_ALPHABET[rng.gen_range(0..ID_ALPHABET.len())] as char)
        .collect();
    format!("msg_{}_{}", now.timestamp_millis(), suffix)
}

/// Request body for sending a message between agents
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    #[serde(default)]
    pub from_agent: String,
    #[serde(default)]
    pub to_agent: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub message_type: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
}

impl SendMessageRequest {
    /// Validate the request and stamp it into a deliverable message
    pub fn into_message(self, now: DateTime<Utc>) -> Result<AgentMessage> {
        let from_agent = require_text(&self.from_agent, "fromAgent")?;
        let to_agent = require_text(&self.to_agent, "toAgent")?;
        let message = require_text(&self.message, "message")?;
        // The log keeps millisecond precision only.
        let now = Utc
            .timestamp_millis_opt(now.timestamp_millis())
            .single()
            .unwrap_or(now);

        Ok(AgentMessage {
            id: generate_message_id(now),
            from_agent,
            to_agent,
            message,
            message_type: or_default(self.message_type, "info"),
            priority: or_default(self.priority, "normal"),
            timestamp: now,
            status: DELIVERED.to_string(),
        })
    }
}

fn or_default(value: Option<String>, default: &str) -> String {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

/// A message exchanged between agents, stored in the external log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentMessage {
    pub id: String,
    pub from_agent: String,
    pub to_agent: String,
    pub message: String,
    pub message_type: String,
    pub priority: String,
    pub timestamp: DateTime<Utc>,
    pub status: String,
}

impl AgentMessage {
    /// Flat metadata stored alongside the message text
    pub fn metadata(&self) -> serde_json::Map<String, serde_json::Value> {
        let mut map = serde_json::Map::new();
        map.insert("fromAgent".into(), self.from_agent.clone().into());
        map.insert("toAgent".into(), self.to_agent.clone().into());
        map.insert("messageType".into(), self.message_type.clone().into());
        map.insert("priority".into(), self.priority.clone().into());
        map.insert("timestamp".into(), self.timestamp.timestamp_millis().into());
        map.insert("status".into(), self.status.clone().into());
        map
    }

    /// Rebuild a message from a log record; missing metadata falls back to blanks
    pub fn from_record(
        id: String,
        document: Option<String>,
        metadata: &serde_json::Map<String, serde_json::Value>,
    ) -> Self {
        let text = |key: &str| {
            metadata
                .get(key)
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string()
        };
        let timestamp = metadata
            .get("timestamp")
            .and_then(|v| v.as_i64())
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
            .unwrap_or_default();

        Self {
            id,
            from_agent: text("fromAgent"),
            to_agent: text("toAgent"),
            message: document.unwrap_or_default(),
            message_type: text("messageType"),
            priority: text("priority"),
            timestamp,
            status: text("status"),
        }
    }
}
