//! External coordination service
//!
//! The vector store is used as a key/value directory of agents and as an
//! append-only message log. Nothing here ranks or indexes; every call is a
//! pass-through that reports an explicit [`ServiceOutcome`].

pub mod agent_directory;
pub mod embedding;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{DeckError, Result};

pub use agent_directory::AgentDirectory;

/// Collection holding one record per registered agent, keyed by agentId
pub const AGENT_DIRECTORY: &str = "agent_directory";
/// Collection holding every relayed agent message
pub const MESSAGE_LOG: &str = "agent_message_log";

/// A record stored in a vector-store collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorRecord {
    pub id: String,
    pub document: Option<String>,
    pub metadata: Map<String, Value>,
}

/// A similarity query against one collection
#[derive(Debug, Clone, PartialEq)]
pub struct VectorQuery {
    pub text: String,
    pub n_results: usize,
    /// Metadata filter in the service's `where` syntax
    pub filter: Option<Value>,
}

/// Collection-based add/get/query API of the vector store
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VectorStore: Send + Sync {
    async fn heartbeat(&self) -> Result<()>;

    /// Insert new records; ids already present are left untouched
    async fn add(&self, collection: &str, records: Vec<VectorRecord>) -> Result<()>;

    /// Insert records, replacing any with the same id
    async fn upsert(&self, collection: &str, records: Vec<VectorRecord>) -> Result<()>;

    /// Records with the given ids; unknown ids are simply absent
    async fn get(&self, collection: &str, ids: Vec<String>) -> Result<Vec<VectorRecord>>;

    /// Records in whatever order the service ranks them
    async fn query(&self, collection: &str, query: VectorQuery) -> Result<Vec<VectorRecord>>;
}

/// Result of a call to the external service
///
/// `Unavailable` means no client was connected at boot or the service could
/// not be reached; `Error` means the service answered with a failure.
#[derive(Debug)]
pub enum ServiceOutcome<T> {
    Ok(T),
    Unavailable,
    Error(DeckError),
}

impl<T> ServiceOutcome<T> {
    pub fn is_ok(&self) -> bool {
        matches!(self, ServiceOutcome::Ok(_))
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, ServiceOutcome::Unavailable)
    }

    /// The value, discarding the reason for its absence
    pub fn ok(self) -> Option<T> {
        match self {
            ServiceOutcome::Ok(value) => Some(value),
            _ => None,
        }
    }

    /// Convert into a hard dependency: `Unavailable` becomes `ServiceUnavailable`
    pub fn require(self, service: &str) -> Result<T> {
        match self {
            ServiceOutcome::Ok(value) => Ok(value),
            ServiceOutcome::Unavailable => Err(DeckError::ServiceUnavailable(format!(
                "{} is not available",
                service
            ))),
            ServiceOutcome::Error(err) => Err(err),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ServiceOutcome<U> {
        match self {
            ServiceOutcome::Ok(value) => ServiceOutcome::Ok(f(value)),
            ServiceOutcome::Unavailable => ServiceOutcome::Unavailable,
            ServiceOutcome::Error(err) => ServiceOutcome::Error(err),
        }
    }
}

impl<T> From<Result<T>> for ServiceOutcome<T> {
    fn from(result: Result<T>) -> Self {
        match result {
            Ok(value) => ServiceOutcome::Ok(value),
            Err(err) => ServiceOutcome::Error(err),
        }
    }
}
