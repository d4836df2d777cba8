// Standalone MCP server binary

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use study_core::storage::RedbProgressStore;
use study_core::{GeneratorConfig, OpenAiGenerator, ProgressTracker};
use study_mcp::tools::study_registry;
use study_mcp::{Dispatcher, McpServer};

#[tokio::main]
async fn main() -> Result<()> {
    // stdout carries the protocol, so logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    tracing::info!("Study assistant MCP server starting...");

    let data_dir = std::env::var("STUDY_DATA_DIR").unwrap_or_else(|_| "./data".to_string());
    let data_path = PathBuf::from(data_dir);

    let store = RedbProgressStore::new(data_path.join("progress.redb"))
        .context("Failed to open progress store")?;
    let tracker = Arc::new(ProgressTracker::new(Arc::new(store)));

    let mut generator_config = GeneratorConfig {
        api_key: std::env::var("OPENAI_API_KEY").ok(),
        ..Default::default()
    };
    if let Some(model) = std::env::var("OPENAI_MODEL").ok().filter(|m| !m.trim().is_empty()) {
        generator_config.model = model;
    }
    let generator = OpenAiGenerator::new(generator_config)?;
    if !generator.is_configured() {
        tracing::warn!("OPENAI_API_KEY is not set; content tools will fail until it is configured");
    }

    let registry = study_registry(Arc::new(generator), tracker)?;
    tracing::info!("Registered {} tools", registry.len());

    let server = McpServer::new(Dispatcher::new(Arc::new(registry)));
    server.start().await?;

    Ok(())
}
