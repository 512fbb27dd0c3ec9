use clap::Parser;
use tracing_subscriber::EnvFilter;

use storex::cli::{self, Cli};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("storex=info,tower_http=info")),
        )
        .init();

    // Initialize configuration (this loads the config singleton)
    let config = storex::config::config();
    tracing::info!("Starting storex in {:?} mode", config.environment);

    cli::run(Cli::parse(), config).await
}
