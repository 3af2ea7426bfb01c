//! Chroma vector store adapter (HTTP API v1)
//!
//! Collections are resolved to ids once at connect time; embeddings are
//! computed locally so the server needs no embedding function.

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use tracing::{debug, info};

use crate::directory::embedding::embed;
use crate::directory::{VectorQuery, VectorRecord, VectorStore};
use crate::error::{DeckError, Result};

#[derive(Debug, Deserialize)]
struct CollectionResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
struct GetResponse {
    ids: Vec<String>,
    #[serde(default)]
    documents: Option<Vec<Option<String>>>,
    #[serde(default)]
    metadatas: Option<Vec<Option<Map<String, Value>>>>,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    ids: Vec<Vec<String>>,
    #[serde(default)]
    documents: Option<Vec<Vec<Option<String>>>>,
    #[serde(default)]
    metadatas: Option<Vec<Vec<Option<Map<String, Value>>>>>,
}

/// Zip the parallel id/document/metadata columns of a response into records
fn zip_records(
    ids: Vec<String>,
    documents: Option<Vec<Option<String>>>,
    metadatas: Option<Vec<Option<Map<String, Value>>>>,
) -> Vec<VectorRecord> {
    let mut documents = documents.unwrap_or_default().into_iter();
    let mut metadatas = metadatas.unwrap_or_default().into_iter();
    ids.into_iter()
        .map(|id| VectorRecord {
            id,
            document: documents.next().flatten(),
            metadata: metadatas.next().flatten().unwrap_or_default(),
        })
        .collect()
}

#[derive(Clone)]
pub struct ChromaClient {
    http: Client,
    base_url: String,
    /// collection name -> collection id
    collections: HashMap<String, String>,
}

impl ChromaClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let parsed = url::Url::parse(base_url)
            .map_err(|e| DeckError::Internal(format!("invalid vector store URL {}: {}", base_url, e)))?;

        let http = Client::builder()
            .user_agent("agentdeck-chroma-adapter/0.1")
            .build()
            .map_err(|e| DeckError::Internal(format!("failed to build Chroma HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: parsed.as_str().trim_end_matches('/').to_string(),
            collections: HashMap::new(),
        })
    }

    /// Check the server is alive and make sure every named collection exists
    pub async fn connect(base_url: &str, collection_names: &[&str]) -> Result<Self> {
        let mut client = Self::new(base_url)?;
        client.heartbeat().await?;

        for name in collection_names {
            let id = client.get_or_create_collection(name).await?;
            debug!("Chroma collection {} -> {}", name, id);
            client.collections.insert(name.to_string(), id);
        }

        info!("Connected to Chroma at {}", client.base_url);
        Ok(client)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v1{}", self.base_url, path)
    }

    fn collection_id(&self, name: &str) -> Result<&str> {
        self.collections
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| DeckError::VectorStore(format!("collection {} was not opened", name)))
    }

    async fn check(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(DeckError::VectorStore(format!("HTTP {}: {}", status, body)))
    }

    async fn post<T: DeserializeOwned>(&self, path: &str, body: &Value) -> Result<T> {
        let response = self.http.post(self.url(path)).json(body).send().await?;
        Ok(Self::check(response).await?.json::<T>().await?)
    }

    /// Send records to `add` or `upsert`; both take the same column layout
    async fn write(&self, action: &str, collection: &str, records: Vec<VectorRecord>) -> Result<()> {
        let id = self.collection_id(collection)?;
        let embeddings: Vec<Vec<f32>> = records
            .iter()
            .map(|r| embed(r.document.as_deref().unwrap_or(&r.id)))
            .collect();
        let body = json!({
            "ids": records.iter().map(|r| r.id.as_str()).collect::<Vec<_>>(),
            "embeddings": embeddings,
            "documents": records.iter().map(|r| r.document.as_deref()).collect::<Vec<_>>(),
            "metadatas": records.iter().map(|r| &r.metadata).collect::<Vec<_>>(),
        });

        let response = self
            .http
            .post(self.url(&format!("/collections/{}/{}", id, action)))
            .json(&body)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn get_or_create_collection(&self, name: &str) -> Result<String> {
        let body = json!({ "name": name, "get_or_create": true });
        let collection: CollectionResponse = self.post("/collections", &body).await?;
        Ok(collection.id)
    }
}

#[async_trait]
impl VectorStore for ChromaClient {
    async fn heartbeat(&self) -> Result<()> {
        let response = self.http.get(self.url("/heartbeat")).send().await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn add(&self, collection: &str, records: Vec<VectorRecord>) -> Result<()> {
        self.write("add", collection, records).await
    }

    async fn upsert(&self, collection: &str, records: Vec<VectorRecord>) -> Result<()> {
        self.write("upsert", collection, records).await
    }

    async fn get(&self, collection: &str, ids: Vec<String>) -> Result<Vec<VectorRecord>> {
        let id = self.collection_id(collection)?;
        let body = json!({ "ids": ids, "include": ["documents", "metadatas"] });
        let response: GetResponse = self
            .post(&format!("/collections/{}/get", id), &body)
            .await?;
        Ok(zip_records(response.ids, response.documents, response.metadatas))
    }

    async fn query(&self, collection: &str, query: VectorQuery) -> Result<Vec<VectorRecord>> {
        let id = self.collection_id(collection)?;
        let mut body = json!({
            "query_embeddings": [embed(&query.text)],
            "n_results": query.n_results,
            "include": ["documents", "metadatas", "distances"],
        });
        if let Some(filter) = query.filter {
            body["where"] = filter;
        }

        let response: QueryResponse = self
            .post(&format!("/collections/{}/query", id), &body)
            .await?;

        // One query embedding in, one result row out.
        let ids = response.ids.into_iter().next().unwrap_or_default();
        let documents = response.documents.and_then(|d| d.into_iter().next());
        let metadatas = response.metadatas.and_then(|m| m.into_iter().next());
        Ok(zip_records(ids, documents, metadatas))
    }
}
