//! greenchain-lms - GreenChain learning management backend
//!
//! Serves the lesson, curriculum, onboarding and essay APIs over HTTP.
//! Configuration comes from a TOML file (see `greenchain_common::config`),
//! with command-line overrides for the most common settings.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use greenchain_common::config::{resolve_config_path, TomlConfig};
use greenchain_common::db::{init_database, init_memory_database};
use greenchain_common::kv::SqliteKvStore;
use greenchain_lms::{build_router, AppState, Catalog, SqliteIdentityProvider};
use tokio::signal;
use tracing::{error, info, warn};

/// Command-line arguments for greenchain-lms
#[derive(Parser, Debug)]
#[command(name = "greenchain-lms")]
#[command(about = "GreenChain LMS backend service")]
#[command(version)]
struct Args {
    /// Config file (overrides GREENCHAIN_CONFIG and the per-user config)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// SQLite database file
    #[arg(short, long, env = "GREENCHAIN_DATABASE")]
    database: Option<PathBuf>,

    /// Address to listen on, e.g. 0.0.0.0:5740
    #[arg(short, long, env = "GREENCHAIN_BIND")]
    bind: Option<String>,

    /// Keep all data in memory; nothing survives a restart
    #[arg(long)]
    ephemeral: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = resolve_config_path(args.config.as_deref());
    let mut config = TomlConfig::load(config_path.as_deref())
        .context("Failed to load configuration")?;
    if let Some(database) = args.database {
        config.database_path = Some(database);
    }
    if let Some(bind) = args.bind {
        config.bind_address = bind;
    }

    // Initialize tracing subscriber; RUST_LOG overrides the configured level
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level)),
        )
        .init();

    // Log build identification immediately after tracing init
    info!(
        "Starting GreenChain LMS (greenchain-lms) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    match &config_path {
        Some(path) => info!("Config file: {}", path.display()),
        None => info!("No config file, using compiled defaults"),
    }

    let pool = if args.ephemeral {
        warn!("Ephemeral mode: data is kept in memory only");
        init_memory_database().await
    } else {
        let db_path = config.resolved_database_path();
        info!("Database path: {}", db_path.display());
        init_database(&db_path).await
    };
    let pool = match pool {
        Ok(pool) => pool,
        Err(e) => {
            error!("Failed to initialize database: {}", e);
            return Err(e.into());
        }
    };

    let catalog = Catalog::load(config.curriculum_path.as_deref())
        .context("Failed to load curriculum catalog")?;
    info!(
        "Curriculum catalog v{}: {} lessons",
        catalog.version,
        catalog.len()
    );

    let kv = Arc::new(SqliteKvStore::new(pool.clone()));
    let identity = Arc::new(SqliteIdentityProvider::new(
        pool,
        chrono::Duration::hours(config.session_ttl_hours),
    ));

    let state = AppState::new(kv, identity, Arc::new(catalog))
        .with_advanced_detection(config.recommendations.advanced_detection)
        .with_api_prefix(config.api_prefix.clone())
        .with_max_body_bytes(config.max_body_bytes);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_address)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind_address))?;
    info!(
        "greenchain-lms listening on http://{}{}",
        config.bind_address, config.api_prefix
    );
    info!(
        "Health check: http://{}{}/health",
        config.bind_address, config.api_prefix
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install terminate handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
