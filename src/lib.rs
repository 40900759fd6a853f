pub mod clock;
pub mod config;
pub mod db;
pub mod error;
pub mod http;
pub mod notifications;
pub mod reminders;
pub mod tasks;
pub mod todos;
pub mod utils;
pub mod wellness;

use std::sync::Arc;

use anyhow::Context;
use clock::Clock;
use config::AppConfig;
use db::Database;
use log::{error, info};
use tokio_util::sync::CancellationToken;
use wellness::WellnessController;

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub clock: Arc<dyn Clock>,
    pub wellness: WellnessController,
}

impl AppState {
    pub fn new(db: Database, clock: Arc<dyn Clock>) -> Self {
        let wellness = WellnessController::new(db.clone(), clock.clone());
        Self {
            db,
            clock,
            wellness,
        }
    }
}

/// Resolves once Ctrl-C is received or `token` is cancelled elsewhere.
async fn shutdown_signal(token: CancellationToken) {
    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            if let Err(err) = result {
                error!("Failed to listen for shutdown signal: {err}");
            }
            info!("Shutdown requested");
            token.cancel();
        }
        _ = token.cancelled() => {}
    }
}

pub async fn run() -> anyhow::Result<()> {
    let config = AppConfig::load()?;
    utils::logging::init(&config.log_level);

    info!("WorkSync starting up...");

    let database = Database::new(config.database_path.clone())?;
    let database_path = database.path().display().to_string();
    let clock: Arc<dyn Clock> = Arc::new(config.clock()?);
    let app = http::router(AppState::new(database, clock));

    let listener = tokio::net::TcpListener::bind(&config.bind_address)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_address))?;
    info!(
        "Listening on {} (database {database_path})",
        listener.local_addr()?
    );

    let shutdown = CancellationToken::new();
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown.clone()))
        .await
        .context("server terminated unexpectedly")?;

    info!("WorkSync stopped");
    Ok(())
}
