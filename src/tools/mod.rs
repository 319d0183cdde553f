//! Tool trait and registry
//!
//! Each retrieval capability is a `Tool` registered under its `ToolKind`.
//! HTTP-backed tools return `Err` on transport or backend failure; the
//! execution engine folds those into empty outcomes.

use crate::config::Settings;
use crate::error::OrchestrationError;
use crate::models::ToolKind;
use crate::Result;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

pub mod catalog;
pub mod vector;
pub mod web;

pub use catalog::ProductCatalogTool;
pub use vector::{Embedder, HashEmbedder, QdrantClient, QdrantSearchTool};
pub use web::StubWebSearch;

/// Trait for a single retrieval capability
#[async_trait::async_trait]
pub trait Tool: Send + Sync {
    fn kind(&self) -> ToolKind;
    fn description(&self) -> &'static str;
    async fn execute(&self, args: &Value) -> Result<Vec<Value>>;
}

/// Tool registry for looking up capabilities by kind
pub struct ToolRegistry {
    tools: HashMap<ToolKind, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Register a tool, replacing any previous implementation of the same kind.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.kind(), tool);
    }

    pub fn get(&self, kind: ToolKind) -> Option<Arc<dyn Tool>> {
        self.tools.get(&kind).cloned()
    }

    pub fn list(&self) -> Vec<ToolKind> {
        self.tools.keys().copied().collect()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn ensure_object_parameters(args: &Value) -> Result<()> {
    if args.is_object() {
        Ok(())
    } else {
        Err(OrchestrationError::InvalidToolInput(
            "tool args must be a JSON object".to_string(),
        ))
    }
}

pub(crate) fn require_str<'a>(args: &'a Value, key: &str) -> Result<&'a str> {
    args.get(key).and_then(Value::as_str).ok_or_else(|| {
        OrchestrationError::InvalidToolInput(format!("Expected '{}' in tool args", key))
    })
}

/// Create the production registry: Qdrant search, product catalog, stub web search.
pub fn create_default_registry(settings: &Settings) -> Result<ToolRegistry> {
    let mut registry = ToolRegistry::new();

    let qdrant = QdrantClient::new(&settings.qdrant_url, &settings.qdrant_collection)?;
    registry.register(Arc::new(QdrantSearchTool::new(
        qdrant,
        Arc::new(HashEmbedder::default()),
    )));
    registry.register(Arc::new(ProductCatalogTool::new(
        settings.product_catalog_url.clone(),
        settings.catalog_timeout,
    )?));
    registry.register(Arc::new(StubWebSearch));

    Ok(registry)
}
