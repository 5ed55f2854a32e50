use financial_research_agent::{
    agent::GroqAgent,
    api::{start_server, ApiState},
    config::Config,
};
use std::sync::Arc;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    // Loads .env as well
    let config = Config::from_env()?;

    if config.groq_api_key.is_none() {
        warn!("GROQ_API_KEY not set; requests must carry their own api_key");
    }

    info!("Financial Research Agent - API Server");
    info!("Port: {}", config.port);
    info!("Model: {}", config.model);

    let agent = Arc::new(GroqAgent::new(&config)?);
    let port = config.port;
    let state = ApiState::new(agent, config);

    info!("Starting API server...");

    start_server(state, port).await?;

    Ok(())
}
