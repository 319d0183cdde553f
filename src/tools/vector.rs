//! Semantic search over the plan knowledge base
//!
//! Talks to Qdrant over its REST API. The embedding function is pluggable;
//! `HashEmbedder` is a deterministic placeholder until a real model is wired in.

use super::{ensure_object_parameters, require_str, Tool};
use crate::config::EMBEDDING_DIM;
use crate::error::OrchestrationError;
use crate::models::ToolKind;
use crate::Result;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Text → vector embedding
#[async_trait::async_trait]
pub trait Embedder: Send + Sync {
    fn dimension(&self) -> usize;
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// Placeholder embedder: every component is the text hash folded into [0, 1).
pub struct HashEmbedder {
    dim: usize,
}

impl HashEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim }
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new(EMBEDDING_DIM)
    }
}

#[async_trait::async_trait]
impl Embedder for HashEmbedder {
    fn dimension(&self) -> usize {
        self.dim
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut hasher = DefaultHasher::new();
        text.hash(&mut hasher);
        let component = (hasher.finish() % 1000) as f32 / 1000.0;
        Ok(vec![component; self.dim])
    }
}

//
// ================= Qdrant REST client =================
//

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredPoint {
    pub id: Value,
    pub score: f64,
    #[serde(default)]
    pub payload: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PointStruct {
    pub id: String,
    pub vector: Vec<f32>,
    pub payload: Value,
}

#[derive(Debug, Deserialize)]
struct QdrantResponse<T> {
    result: T,
}

#[derive(Clone)]
pub struct QdrantClient {
    client: Client,
    base_url: String,
    collection: String,
}

impl QdrantClient {
    pub fn new(base_url: &str, collection: &str) -> Result<Self> {
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(60))
            .pool_max_idle_per_host(8)
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            collection: collection.to_string(),
        })
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    async fn send_json(&self, method: reqwest::Method, path: &str, body: &Value) -> Result<Value> {
        let url = format!("{}{}", self.base_url, path);

        let response = self
            .client
            .request(method, url)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                OrchestrationError::ToolError(format!("Qdrant request failed for {}: {}", path, e))
            })?;

        let status = response.status();
        let body = response
            .json::<Value>()
            .await
            .map_err(|e| OrchestrationError::ToolError(format!("Invalid Qdrant response: {}", e)))?;

        if !status.is_success() {
            return Err(OrchestrationError::ToolError(format!(
                "Qdrant returned {} for {}: {}",
                status, path, body
            )));
        }

        Ok(body)
    }

    pub async fn search(&self, vector: Vec<f32>, limit: usize) -> Result<Vec<ScoredPoint>> {
        let path = format!("/collections/{}/points/search", self.collection);
        let body = self
            .send_json(
                reqwest::Method::POST,
                &path,
                &json!({
                    "vector": vector,
                    "limit": limit,
                    "with_payload": true,
                }),
            )
            .await?;

        parse_search_response(body)
    }

    /// Drop (if present) and create the collection with cosine distance.
    pub async fn recreate_collection(&self, size: usize) -> Result<()> {
        let path = format!("/collections/{}", self.collection);
        if let Err(e) = self
            .send_json(reqwest::Method::DELETE, &path, &json!({}))
            .await
        {
            debug!(error = %e, "Collection delete skipped");
        }

        self.send_json(
            reqwest::Method::PUT,
            &path,
            &json!({
                "vectors": { "size": size, "distance": "Cosine" }
            }),
        )
        .await?;
        Ok(())
    }

    pub async fn upsert_points(&self, points: Vec<PointStruct>) -> Result<()> {
        let path = format!("/collections/{}/points?wait=true", self.collection);
        self.send_json(reqwest::Method::PUT, &path, &json!({ "points": points }))
            .await?;
        Ok(())
    }
}

fn parse_search_response(body: Value) -> Result<Vec<ScoredPoint>> {
    let parsed: QdrantResponse<Vec<ScoredPoint>> = serde_json::from_value(body)?;
    Ok(parsed.result)
}

/// Render a scored point as the `{id, score, payload}` record the normalizer expects.
fn hit_record(point: ScoredPoint) -> Value {
    json!({
        "id": point.id,
        "score": point.score,
        "payload": Value::Object(point.payload.unwrap_or_default()),
    })
}

//
// ================= Tool =================
//

pub struct QdrantSearchTool {
    client: QdrantClient,
    embedder: Arc<dyn Embedder>,
}

impl QdrantSearchTool {
    pub fn new(client: QdrantClient, embedder: Arc<dyn Embedder>) -> Self {
        Self { client, embedder }
    }
}

#[async_trait::async_trait]
impl Tool for QdrantSearchTool {
    fn kind(&self) -> ToolKind {
        ToolKind::SemanticSearch
    }

    fn description(&self) -> &'static str {
        "Semantic search over the plan knowledge base"
    }

    async fn execute(&self, args: &Value) -> Result<Vec<Value>> {
        ensure_object_parameters(args)?;
        let query = require_str(args, "query")?;
        let limit = args
            .get("limit")
            .and_then(Value::as_u64)
            .map(|l| l as usize)
            .unwrap_or(5);

        let vector = self.embedder.embed(query).await?;
        let hits = self.client.search(vector, limit).await?;

        debug!(
            collection = %self.client.collection(),
            hits = hits.len(),
            "Semantic search completed"
        );

        Ok(hits.into_iter().map(hit_record).collect())
    }
}
