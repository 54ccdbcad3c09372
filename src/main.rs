use tracing_subscriber::EnvFilter;
use workhub::cli::commands::serve;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("workhub=info,tower_http=info")),
        )
        .init();

    serve::handle(None).await
}
