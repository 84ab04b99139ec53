use anyhow::Context;
use clap::Parser;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tower_sessions::session_store::ExpiredDeletion;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use pinboard_api::auth::MemorySessionStore;
use pinboard_api::config;
use pinboard_api::database::{DatabaseManager, EntityStore, MemoryStore, PgStore};
use pinboard_api::{app, AppState};

const SESSION_SWEEP_SECS: u64 = 60;

/// Pinboard API server
#[derive(Debug, Parser)]
#[command(name = "pinboard-api", version, about)]
struct Args {
    /// Port to listen on (overrides PORT)
    #[arg(long)]
    port: Option<u16>,

    /// Address to bind
    #[arg(long, default_value = "0.0.0.0")]
    bind: IpAddr,

    /// Directory for uploaded files (overrides UPLOADS_DIR)
    #[arg(long)]
    uploads_dir: Option<PathBuf>,

    /// Keep all data in memory even if DATABASE_URL is set
    #[arg(long)]
    in_memory: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, SESSION_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("pinboard_api=info,tower_http=info")),
        )
        .init();

    let args = Args::parse();

    // Environment defaults first, then command line flags
    let mut config = config::config().clone();
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(dir) = args.uploads_dir {
        config.uploads.dir = dir;
    }
    config.validate().map_err(anyhow::Error::msg)?;
    info!("Starting Pinboard API in {:?} mode", config.environment);

    let store: Arc<dyn EntityStore> = match &config.database.url {
        Some(_) if !args.in_memory => {
            let pool = DatabaseManager::connect(&config.database)
                .await
                .context("failed to connect to database")?;
            Arc::new(PgStore::new(pool))
        }
        _ => {
            warn!("Using in-memory store; data is lost on restart");
            Arc::new(MemoryStore::new())
        }
    };

    let sessions = MemorySessionStore::new();
    tokio::spawn(sweep_expired_sessions(sessions.clone()));

    let state = AppState::new(&config, store, sessions)?;

    let addr = SocketAddr::new(args.bind, config.server.port);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    info!("Pinboard API listening on http://{}", addr);

    axum::serve(listener, app(state)).await.context("server error")?;
    Ok(())
}

/// Drop sessions that expired without anyone presenting them again
async fn sweep_expired_sessions(sessions: MemorySessionStore) {
    let mut interval = tokio::time::interval(Duration::from_secs(SESSION_SWEEP_SECS));
    loop {
        interval.tick().await;
        if let Err(e) = sessions.delete_expired().await {
            warn!("Session sweep failed: {}", e);
        }
    }
}
