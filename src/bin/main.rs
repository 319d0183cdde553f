use agentic_rag_orchestrator::{Orchestrator, Query, Settings};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")))
        .init();

    let settings = Settings::from_env()?;

    let text = std::env::args().skip(1).collect::<Vec<_>>().join(" ");
    let text = if text.trim().is_empty() {
        "What are the latest prepaid plans with 2GB per day?".to_string()
    } else {
        text
    };
    let query = Query::new(text, settings.default_region.clone());

    info!(query = %query.text, region = %query.region, "Running orchestrator");

    let orchestrator = Orchestrator::from_settings(&settings)?;

    match orchestrator.run_report(&query).await {
        Ok(report) => {
            info!("Orchestration successful");
            println!("\n=== ORCHESTRATION RESULT ===");
            println!("Run ID: {}", report.run_id);
            println!("Confidence: {:.2}", report.answer.confidence);
            println!("Fallback ran: {}", report.fallback_ran);
            println!("\nPhases:");
            for (i, phase) in report.phases.iter().enumerate() {
                println!("  {}: {}", i + 1, phase);
            }
            println!("\nAnswer:");
            println!("{}", serde_json::to_string_pretty(&report.answer)?);
            Ok(())
        }
        Err(e) => {
            eprintln!("Orchestration failed: {}", e);
            Err(Box::new(e) as Box<dyn std::error::Error>)
        }
    }
}
