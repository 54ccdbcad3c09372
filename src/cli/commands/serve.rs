use crate::config;
use crate::database::DatabaseManager;

/// Run the API server in the foreground
pub async fn handle(port: Option<u16>) -> anyhow::Result<()> {
    let config = config::config();
    tracing::info!("Starting WorkHub API in {:?} mode", config.environment);

    // The server still starts without a database; /health reports it as degraded
    if config.database.run_migrations {
        if let Err(e) = DatabaseManager::migrate().await {
            tracing::error!("Migrations not applied: {}", e);
        }
    }

    let result = crate::server::serve(port.unwrap_or(config.server.port)).await;
    DatabaseManager::close().await;
    result
}
