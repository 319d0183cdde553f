//! REST API server for the retrieval orchestrator
//!
//! Exposes `POST /query` and `GET /health`.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::agent::Orchestrator;
use crate::models::{Answer, AnswerCandidate, Query};
use crate::synthesis::DEFAULT_SOURCE;

/// =============================
/// Request / Response Models
/// =============================

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct QueryRequest {
    pub query: String,
    #[serde(default)]
    pub region: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PlanItem {
    pub name: String,
    pub price: f64,
    pub data_per_day: String,
    pub validity_days: i64,
    pub source: String,
    pub last_updated: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct QueryResponse {
    pub query: String,
    pub plans: Vec<PlanItem>,
    pub generated_at: String,
    pub confidence: f64,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub detail: String,
}

impl From<AnswerCandidate> for PlanItem {
    fn from(c: AnswerCandidate) -> Self {
        Self {
            name: c.name.unwrap_or_else(|| "unknown".to_string()),
            price: c.price.unwrap_or(0.0),
            data_per_day: c.data_per_day.unwrap_or_default(),
            validity_days: c.validity_days.unwrap_or(0),
            source: if c.source.is_empty() {
                DEFAULT_SOURCE.to_string()
            } else {
                c.source
            },
            last_updated: c.last_updated,
        }
    }
}

impl From<Answer> for QueryResponse {
    fn from(answer: Answer) -> Self {
        Self {
            query: answer.query,
            plans: answer.candidates.into_iter().map(PlanItem::from).collect(),
            generated_at: answer.generated_at,
            confidence: answer.confidence,
            notes: answer.summary,
        }
    }
}

/// =============================
/// API State
/// =============================

#[derive(Clone)]
pub struct ApiState {
    pub orchestrator: Arc<Orchestrator>,
    pub default_region: String,
}

/// =============================
/// Health Endpoint
/// =============================

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// =============================
/// Query Endpoint
/// =============================

async fn handle_query(State(state): State<ApiState>, Json(req): Json<QueryRequest>) -> Response {
    let region = req
        .region
        .filter(|r| !r.trim().is_empty())
        .unwrap_or_else(|| state.default_region.clone());
    let query = Query::new(req.query, region);

    info!(query = %query.text, region = %query.region, "Received query");

    match state.orchestrator.run(&query).await {
        Ok(answer) => (StatusCode::OK, Json(QueryResponse::from(answer))).into_response(),
        Err(e) => {
            error!(error = %e, "Error handling query");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    detail: e.to_string(),
                }),
            )
                .into_response()
        }
    }
}

/// =============================
/// Router
/// =============================

pub fn create_router(orchestrator: Arc<Orchestrator>, default_region: impl Into<String>) -> Router {
    let state = ApiState {
        orchestrator,
        default_region: default_region.into(),
    };

    Router::new()
        .route("/health", get(health))
        .route("/query", post(handle_query))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// =============================
/// Server Startup
/// =============================

pub async fn start_server(
    orchestrator: Arc<Orchestrator>,
    default_region: String,
    port: u16,
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let router = create_router(orchestrator, default_region);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;

    info!("API Server listening on http://0.0.0.0:{}", port);
    info!("Local: http://127.0.0.1:{}", port);

    axum::serve(listener, router).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_REGION;
    use crate::execution::ExecutionEngine;
    use crate::models::ToolKind;
    use crate::planner::HeuristicPlanner;
    use crate::synthesis::ResponseSynthesizer;
    use crate::tools::{Tool, ToolRegistry};
    use crate::verification::FreshnessEvaluator;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use serde_json::{json, Value};
    use std::sync::Mutex;
    use tower::ServiceExt;

    /// Records the requested regions and returns one fresh, partly filled plan.
    struct RecordingCatalog {
        regions: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait::async_trait]
    impl Tool for RecordingCatalog {
        fn kind(&self) -> ToolKind {
            ToolKind::CatalogLookup
        }
        fn description(&self) -> &'static str {
            "recording catalog"
        }
        async fn execute(&self, args: &Value) -> crate::Result<Vec<Value>> {
            let region = args["region"].as_str().unwrap_or_default().to_string();
            self.regions.lock().unwrap().push(region);
            Ok(vec![json!({
                "name": "Super 2GB/day",
                "price": 199,
                "last_updated": chrono::Utc::now().to_rfc3339(),
            })])
        }
    }

    fn router() -> (Router, Arc<Mutex<Vec<String>>>) {
        let regions = Arc::new(Mutex::new(Vec::new()));
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(RecordingCatalog {
            regions: regions.clone(),
        }));

        let orchestrator = Orchestrator::new(
            Box::new(HeuristicPlanner::default()),
            ExecutionEngine::new(registry),
            FreshnessEvaluator::default(),
            ResponseSynthesizer::new(None),
        );

        (create_router(Arc::new(orchestrator), DEFAULT_REGION), regions)
    }

    async fn post_query(router: Router, body: Value) -> (StatusCode, Value) {
        let response = router
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/query")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_query_defaults_region_and_fields() {
        let (router, regions) = router();

        let (status, body) = post_query(router, json!({"query": "2GB plans"})).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(*regions.lock().unwrap(), vec!["Maharashtra".to_string()]);
        assert_eq!(body["query"], "2GB plans");
        assert_eq!(body["confidence"], 0.9);
        assert!(body["notes"].is_null());
        assert!(body["generated_at"].as_str().unwrap().ends_with('Z'));

        let plan = &body["plans"][0];
        assert_eq!(plan["name"], "Super 2GB/day");
        assert_eq!(plan["price"], 199.0);
        assert_eq!(plan["data_per_day"], "");
        assert_eq!(plan["validity_days"], 0);
        assert_eq!(plan["source"], "catalog");
    }

    #[tokio::test]
    async fn test_query_uses_requested_region() {
        let (router, regions) = router();

        let (status, _) = post_query(router, json!({"query": "plans", "region": "Punjab"})).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(*regions.lock().unwrap(), vec!["Punjab".to_string()]);
    }

    #[tokio::test]
    async fn test_health() {
        let (router, _) = router();
        let response = router
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn test_plan_item_defaults() {
        let item = PlanItem::from(AnswerCandidate {
            name: None,
            price: None,
            data_per_day: None,
            validity_days: None,
            source: "kb".to_string(),
            last_updated: None,
        });

        assert_eq!(item.name, "unknown");
        assert_eq!(item.price, 0.0);
        assert_eq!(item.validity_days, 0);
        assert_eq!(item.source, "kb");
    }
}
