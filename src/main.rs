//! Newsletter Platform API Server
//! Mission: Serve the creator/subscriber API over HTTP
//!
//! Startup: load .env, init tracing, parse config, open SQLite, bootstrap the
//! admin account, then serve until the process is stopped.

use anyhow::{Context, Result};
use clap::Parser;
use dotenv::dotenv;
use newsletter_backend::{app, AppState, Config, Database};
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    load_env();
    init_tracing();

    let config = Config::parse();

    info!("🚀 Newsletter API starting");
    info!("📁 Database: {}", config.database_path);

    let db = Database::open(&config.database_path)
        .with_context(|| format!("Failed to open database {}", config.database_path))?;

    let state = AppState::from_config(&config, db)?;

    if let Some((email, password)) = config.admin_credentials() {
        state
            .auth
            .bootstrap_admin(email, password.to_string())
            .await
            .context("Failed to bootstrap admin account")?;
    }

    // Prune idle rate-limit entries
    let limiter = state.rate_limiter.clone();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(60));
        loop {
            ticker.tick().await;
            limiter.cleanup();
        }
    });

    let app = app::router(state).layer(app::cors_layer(&config.cors_origins));

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;
    info!("🎯 API server listening on {}", config.bind_addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("Server error")?;

    info!("👋 Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}

/// Initialize tracing; RUST_LOG overrides the default filter
fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "newsletter_backend=debug,newsletter=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn load_env() {
    // 1) Standard dotenv search (cwd + parents)
    let _ = dotenv();

    // 2) Also try the crate's own .env when launched from elsewhere
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    let candidate = manifest_dir.join(".env");
    if candidate.exists() {
        let _ = dotenv::from_path(&candidate);
    }
}
