//! # GST Ease API Server
//!
//! ## Startup Sequence
//! ```text
//! 1. Tracing
//! 2. AppConfig::load (defaults → gstease.toml → GSTEASE__* env)
//! 3. Database (pool + migrations)
//! 4. Notifier (SMTP or log-only) + dispatcher task
//! 5. axum::serve until Ctrl+C / SIGTERM
//! 6. Drain notification queue, close pool
//! ```

use std::net::SocketAddr;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{info, warn};

use gstease_api::{build_router, init_tracing, AppConfig, AppState};
use gstease_db::Database;
use gstease_notify::Dispatcher;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    info!("Starting GST Ease API server...");

    let config = AppConfig::load().context("Failed to load configuration")?;
    info!(
        port = config.http_port,
        database = %config.database_path,
        stock_policy = ?config.stock_policy,
        pricing = ?config.pricing,
        "Configuration loaded"
    );

    let db = Database::new(config.db_config())
        .await
        .context("Failed to open database")?;

    let notifier = gstease_notify::from_config(&config.smtp).context("Failed to set up notifier")?;
    info!(notifier = notifier.name(), "Notifier ready");

    let (dispatcher, handle) = Dispatcher::new(notifier, config.dispatcher_config());
    let dispatcher_task = tokio::spawn(dispatcher.run());

    let state = AppState::new(db.clone(), handle.clone(), &config);
    let app = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.http_port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!(%addr, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    if let Err(e) = handle.shutdown().await {
        warn!(error = %e, "Notification dispatcher already stopped");
    }
    if let Err(e) = dispatcher_task.await {
        warn!(error = %e, "Notification dispatcher task failed");
    }
    db.close().await;

    info!("Server shutdown complete");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown...");
}
