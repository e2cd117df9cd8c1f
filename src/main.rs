use anyhow::Result;
use tracing::info;

use connmetrics::api;
use connmetrics::config::Config;
use connmetrics::storage;

#[tokio::main]
async fn main() -> Result<()> {
    connmetrics::init_tracing();

    // Load configuration
    let config = Config::from_env()?;
    info!("Loaded configuration");

    // Initialize storage
    let table = storage::open_connections_table(&config.database).await?;

    let router = api::create_api_router(table, config.max_report_bytes);

    let api_addr = format!("{}:{}", config.api_server.host, config.api_server.port);
    let listener = tokio::net::TcpListener::bind(&api_addr).await?;
    info!("🚀 Metrics server listening on http://{}", api_addr);
    info!("   - Reports accepted at POST http://{}/connections", api_addr);

    axum::serve(listener, router).await?;

    Ok(())
}
