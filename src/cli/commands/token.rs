use serde_json::json;
use uuid::Uuid;

use crate::cli::utils::output_success;
use crate::cli::OutputFormat;
use crate::database::DatabaseManager;
use crate::services::AccountService;

/// Mint a token for an existing account, e.g. for scripted API calls
pub async fn handle(user_id: Uuid, output_format: OutputFormat) -> anyhow::Result<()> {
    let pool = DatabaseManager::main_pool().await?;
    let user = AccountService::new(pool).get(user_id).await?;
    DatabaseManager::close().await;

    let session = AccountService::issue_session(user, None)?;
    tracing::info!("Issued operator token for {}", session.user.id);

    match output_format {
        OutputFormat::Json => output_success(
            output_format,
            "Token issued",
            Some(json!({ "token": session.token, "expires_in": session.expires_in, "user_id": session.user.id })),
        ),
        OutputFormat::Text => {
            println!("{}", session.token);
            Ok(())
        }
    }
}
