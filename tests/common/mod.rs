#![allow(dead_code)]

use agentdeck::api::{create_router, AppState};
use agentdeck::config::ServerConfig;
use agentdeck::directory::{AgentDirectory, VectorQuery, VectorRecord, VectorStore};
use agentdeck::error::{DeckError, Result};
use agentdeck::persistence::MemoryStore;
use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

/// Vector store kept in process memory
///
/// `add` skips ids that already exist while `upsert` replaces them, as the
/// real service does. `get` is an exact id lookup and `query` honours the
/// `$or` equality filter the message log uses, returning the newest records
/// first.
#[derive(Default)]
pub struct FakeVectorStore {
    collections: Mutex<HashMap<String, Vec<VectorRecord>>>,
    failing: bool,
}

impl FakeVectorStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose every call fails
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn records(&self, collection: &str) -> Vec<VectorRecord> {
        self.collections
            .lock()
            .unwrap()
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }

    fn check(&self) -> Result<()> {
        if self.failing {
            Err(DeckError::VectorStore("HTTP 500: fake outage".into()))
        } else {
            Ok(())
        }
    }
}

fn matches_filter(record: &VectorRecord, filter: &Value) -> bool {
    let Some(clauses) = filter.get("$or").and_then(Value::as_array) else {
        return true;
    };
    clauses.iter().any(|clause| {
        clause
            .as_object()
            .map(|fields| {
                fields
                    .iter()
                    .all(|(key, value)| record.metadata.get(key) == Some(value))
            })
            .unwrap_or(false)
    })
}

#[async_trait]
impl VectorStore for FakeVectorStore {
    async fn heartbeat(&self) -> Result<()> {
        self.check()
    }

    async fn add(&self, collection: &str, records: Vec<VectorRecord>) -> Result<()> {
        self.check()?;
        let mut collections = self.collections.lock().unwrap();
        let entries = collections.entry(collection.to_string()).or_default();
        for record in records {
            if !entries.iter().any(|existing| existing.id == record.id) {
                entries.push(record);
            }
        }
        Ok(())
    }

    async fn upsert(&self, collection: &str, records: Vec<VectorRecord>) -> Result<()> {
        self.check()?;
        let mut collections = self.collections.lock().unwrap();
        let entries = collections.entry(collection.to_string()).or_default();
        for record in records {
            entries.retain(|existing| existing.id != record.id);
            entries.push(record);
        }
        Ok(())
    }

    async fn get(&self, collection: &str, ids: Vec<String>) -> Result<Vec<VectorRecord>> {
        self.check()?;
        Ok(self
            .records(collection)
            .into_iter()
            .filter(|record| ids.contains(&record.id))
            .collect())
    }

    async fn query(&self, collection: &str, query: VectorQuery) -> Result<Vec<VectorRecord>> {
        self.check()?;
        Ok(self
            .records(collection)
            .into_iter()
            .rev()
            .filter(|record| query.filter.as_ref().map_or(true, |f| matches_filter(record, f)))
            .take(query.n_results)
            .collect())
    }
}

pub fn server_config(uploads_dir: &str) -> ServerConfig {
    ServerConfig {
        port: 0,
        frontend_url: "http://localhost:3000".to_string(),
        uploads_dir: uploads_dir.to_string(),
    }
}

/// State over a fresh in-memory store and the given directory
pub fn state_with(directory: AgentDirectory, expose_errors: bool) -> AppState {
    AppState::new(Arc::new(MemoryStore::new()), directory, expose_errors)
}

/// Router plus its state, backed by an in-memory store and a working fake directory
pub fn test_app() -> (Router, AppState, Arc<FakeVectorStore>) {
    let vectors = Arc::new(FakeVectorStore::new());
    let state = state_with(AgentDirectory::new(vectors.clone()), false);
    let router = create_router(state.clone(), &server_config("uploads"));
    (router, state, vectors)
}

pub fn app_for(state: AppState) -> Router {
    create_router(state, &server_config("uploads"))
}

pub async fn send_json(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let request_builder = Request::builder().method(method).uri(uri);

    let request = if let Some(payload) = body {
        request_builder
            .header("content-type", "application/json")
            .body(Body::from(payload.to_string()))
            .expect("failed to build json request")
    } else {
        request_builder
            .body(Body::empty())
            .expect("failed to build empty request")
    };

    send(app, request).await
}

pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(request)
        .await
        .expect("router request failed");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("failed to read response body");
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            Value::String(String::from_utf8_lossy(&bytes).to_string())
        })
    };

    (status, body)
}
