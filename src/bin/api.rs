use financial_chatbot::{
    agent::FinancialChatbot, api::start_server, config::AppConfig, session::InMemorySessionStore,
};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env before the filter reads RUST_LOG
    let config = AppConfig::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Financial Chatbot - API Server");
    info!("Port: {}", config.port);

    let chatbot = Arc::new(FinancialChatbot::new(Box::new(InMemorySessionStore::new())));

    if config.load_sample_on_start {
        let summary = chatbot.load_sample().await?;
        info!(session_id = %summary.session_id, "Sample dataset installed");
    }

    start_server(
        chatbot,
        &config.bind_addr,
        config.port,
        config.max_upload_bytes,
    )
    .await?;

    Ok(())
}
