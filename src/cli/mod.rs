use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;

use crate::config::CONFIG;
use crate::database::{DatabaseManager, PgClient};
use crate::routes;

#[derive(Parser)]
#[command(name = "crud-rest-api")]
#[command(about = "REST CRUD API for users and posts backed by PostgreSQL")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Port to listen on (overrides PORT / API_PORT)")]
    pub port: Option<u16>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Commands {
    #[command(about = "Run the HTTP server (default)")]
    Serve,

    #[command(about = "Apply database migrations and exit")]
    Migrate,
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(cli.port).await,
        Commands::Migrate => migrate().await,
    }
}

async fn migrate() -> anyhow::Result<()> {
    let pool = DatabaseManager::connect(&CONFIG.database).await?;
    DatabaseManager::migrate(&pool).await?;
    pool.close().await;
    Ok(())
}

async fn serve(port: Option<u16>) -> anyhow::Result<()> {
    info!("Starting crud-rest-api in {:?} mode", CONFIG.environment);

    let pool = DatabaseManager::connect(&CONFIG.database).await?;
    if CONFIG.database.run_migrations {
        DatabaseManager::migrate(&pool).await?;
    }

    let app = routes::app(Arc::new(PgClient::new(pool)));

    let port = port.unwrap_or(CONFIG.api.port);
    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    info!("Listening on http://{}", bind_addr);
    axum::serve(listener, app).await?;
    Ok(())
}
