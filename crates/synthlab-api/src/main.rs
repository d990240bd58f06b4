//! SynthLab API server entry point.

use std::error::Error;
use std::net::SocketAddr;
use std::sync::Arc;

use synthlab_api::config::Settings;
use synthlab_api::state::AppState;
use synthlab_api::{housekeeping, telemetry};
use synthlab_core::clock::{Clock, SystemClock};
use synthlab_store::db;
use synthlab_store::pg_revocation_store::PgRevocationStore;
use tokio::sync::watch;
use tracing::{info, warn};

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let settings = Settings::from_env()?;
    let telemetry = telemetry::init(settings.otel_endpoint.as_deref())?;

    info!(?settings, "Starting SynthLab API server");

    let pool = db::connect(
        &settings.database_url,
        settings.db_max_connections,
        settings.persistence_timeout,
    )
    .await?;
    db::migrate(&pool).await?;
    tokio::fs::create_dir_all(&settings.image_dir).await?;

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let app_state = AppState::from_settings(pool.clone(), &settings, Arc::clone(&clock));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let purge = housekeeping::spawn_revocation_purge(
        PgRevocationStore::new(pool, clock),
        settings.revocation_purge_interval,
        shutdown_rx,
    );

    let app = synthlab_api::app_with_images(app_state, &settings.image_dir);

    let addr: SocketAddr = settings
        .bind_address()
        .parse()
        .map_err(|e| format!("invalid HOST:PORT combination: {e}"))?;
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if shutdown_tx.send(true).is_err() {
        warn!("revocation purge had already stopped");
    }
    if let Err(err) = purge.await {
        warn!(error = %err, "revocation purge task failed");
    }
    telemetry.shutdown();

    Ok(())
}
