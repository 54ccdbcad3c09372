use clap::Subcommand;

use crate::cli::utils::output_success;
use crate::cli::OutputFormat;
use crate::database::DatabaseManager;

#[derive(Subcommand)]
pub enum DbCommands {
    #[command(about = "Apply pending schema migrations")]
    Migrate,

    #[command(about = "Check that the database is reachable")]
    Check,
}

pub async fn handle(cmd: DbCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let result = match cmd {
        DbCommands::Migrate => DatabaseManager::migrate().await.map(|_| "Migrations applied"),
        DbCommands::Check => DatabaseManager::health_check().await.map(|_| "Database is reachable"),
    };
    DatabaseManager::close().await;

    let message = result?;
    output_success(output_format, message, None)
}
