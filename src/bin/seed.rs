//! Seed the vector store with the sample plan documents.

use agentic_rag_orchestrator::config::EMBEDDING_DIM;
use agentic_rag_orchestrator::tools::vector::PointStruct;
use agentic_rag_orchestrator::tools::QdrantClient;
use agentic_rag_orchestrator::Settings;
use serde_json::json;
use tracing::info;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

fn point(key: &str, vector_value: f32, payload: serde_json::Value) -> PointStruct {
    PointStruct {
        id: Uuid::new_v5(&Uuid::NAMESPACE_DNS, key.as_bytes()).to_string(),
        vector: vec![vector_value; EMBEDDING_DIM],
        payload,
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = Settings::from_env()?;
    let client = QdrantClient::new(&settings.qdrant_url, &settings.qdrant_collection)?;

    client.recreate_collection(EMBEDDING_DIM).await?;

    let points = vec![
        point(
            "plan-199-2gb",
            0.01,
            json!({
                "name": "Super 2GB/day",
                "price": 199,
                "data_per_day": "2GB",
                "validity_days": 28,
                "last_updated": "2025-08-12T10:00:00Z",
                "source": "kb",
            }),
        ),
        point(
            "plan-299-3gb",
            0.02,
            json!({
                "name": "Ultra 3GB/day",
                "price": 299,
                "data_per_day": "3GB",
                "validity_days": 30,
                "last_updated": "2025-08-13T09:00:00Z",
                "source": "kb",
            }),
        ),
    ];

    let count = points.len();
    client.upsert_points(points).await?;

    info!(
        collection = %settings.qdrant_collection,
        points = count,
        "Seeded Qdrant with sample plans"
    );

    Ok(())
}
