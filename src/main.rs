use clap::Parser;
use tracing_subscriber::EnvFilter;

use crud_rest_api::cli::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, APP_ENV, etc.
    let _ = dotenvy::dotenv();

    let default_level = if crud_rest_api::is_development!() { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let cli = Cli::parse();
    crud_rest_api::cli::run(cli).await
}
