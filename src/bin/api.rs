use agentic_rag_orchestrator::{api::start_server, Orchestrator, Settings};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = Settings::from_env()?;

    if settings.gemini_api_key.is_none() {
        eprintln!("⚠️  GEMINI_API_KEY not set in .env, answers will not include a summary");
    }

    info!("🚀 Agentic RAG Orchestrator - API Server");
    info!("📍 Port: {}", settings.port);
    info!(
        qdrant = %settings.qdrant_url,
        collection = %settings.qdrant_collection,
        catalog = settings.product_catalog_url.as_deref().unwrap_or("built-in sample"),
        "Retrieval backends"
    );

    let orchestrator = Arc::new(Orchestrator::from_settings(&settings)?);

    info!("✅ Orchestrator initialized");
    info!("📡 Starting API server...");

    start_server(orchestrator, settings.default_region.clone(), settings.port).await?;

    Ok(())
}
