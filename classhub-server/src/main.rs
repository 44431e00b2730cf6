//! classhub-server - Classroom management API
//!
//! Startup order: configuration, logging, root folder, database, shared
//! secret, mailer, HTTP listener.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use classhub_common::api::auth::load_shared_secret;
use classhub_common::config::{RootFolderInitializer, RootFolderResolver, TomlConfig};
use classhub_common::db::init_database;
use classhub_server::services::{LogMailer, Mailer, WebhookMailer};
use classhub_server::{build_router, db, AppState};
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Command-line arguments for classhub-server
#[derive(Parser, Debug)]
#[command(name = "classhub-server")]
#[command(about = "Classroom management API server")]
#[command(version)]
struct Args {
    /// Root folder holding the database
    #[arg(short, long, env = "CLASSHUB_ROOT_FOLDER")]
    root_folder: Option<PathBuf>,

    /// TOML configuration file
    #[arg(short, long, env = "CLASSHUB_CONFIG")]
    config: Option<PathBuf>,

    /// Port to listen on (overrides the config file)
    #[arg(short, long, env = "CLASSHUB_PORT")]
    port: Option<u16>,

    /// Address to bind (overrides the config file)
    #[arg(long, env = "CLASSHUB_BIND")]
    bind: Option<String>,

    /// Promote an existing user to ADMIN at startup
    #[arg(long, env = "CLASSHUB_PROMOTE_ADMIN")]
    promote_admin: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Config is needed for the default log level, so load it before
    // tracing is up; problems are reported right after.
    let config_result = TomlConfig::load_or_default(args.config.as_deref());
    let log_level = config_result
        .as_ref()
        .map(|c| c.logging.level.clone())
        .unwrap_or_else(|_| "info".to_string());

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_level)))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting ClassHub server v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let config = config_result.context("Failed to load configuration")?;

    let root_folder = RootFolderResolver::new()
        .with_cli_arg(args.root_folder)
        .with_toml_config(&config)
        .resolve();
    let initializer = RootFolderInitializer::new(root_folder);
    initializer.ensure_directory_exists()?;
    info!("Root folder: {}", initializer.root_folder().display());

    let db_path = initializer.database_path_with(&config);
    info!("Database path: {}", db_path.display());
    let pool = init_database(&db_path)
        .await
        .context("Failed to initialize database")?;

    let shared_secret = load_shared_secret(&pool)
        .await
        .context("Failed to load shared secret")?;
    if shared_secret == 0 {
        warn!("API signature checking disabled (shared_secret = 0)");
    } else {
        info!("Loaded shared secret for API authentication");
    }

    if let Some(user_id) = args.promote_admin.as_deref() {
        if db::users::promote_to_admin(&pool, user_id).await? {
            info!(user_id, "Promoted user to ADMIN");
        } else {
            warn!(user_id, "Cannot promote unknown user to ADMIN");
        }
    }

    let mailer: Arc<dyn Mailer> = match config.mail_webhook_url.as_deref() {
        Some(url) if !url.trim().is_empty() => {
            info!("Notification mail via webhook: {}", url);
            Arc::new(WebhookMailer::new(url)?)
        }
        _ => {
            info!("Notification mail is log-only (no mail_webhook_url)");
            Arc::new(LogMailer)
        }
    };

    let state = AppState::new(pool.clone(), shared_secret, mailer);
    let app = build_router(state);

    let bind = args.bind.unwrap_or(config.bind);
    let port = args.port.unwrap_or(config.port);
    let addr = format!("{}:{}", bind, port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("classhub-server listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    pool.close().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
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
