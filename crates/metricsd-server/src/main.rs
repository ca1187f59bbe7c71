//! metricsd server
//!
//! - Loads `metricsd.yaml` (or the path given as the first argument)
//! - Restores the snapshot file, then saves it on a fixed interval
//! - Serves the update/value routes until Ctrl-C, drains, then saves once more

use std::net::SocketAddr;

use tracing_subscriber::{fmt, EnvFilter};

use metricsd_core::error::{MetricsError, Result};
use metricsd_server::{app_state, config, router, storage::LoadOutcome};

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let path = std::env::args().nth(1).unwrap_or_else(|| "metricsd.yaml".to_string());
    let cfg = config::load_from_file(&path)?;
    let listen: SocketAddr = cfg
        .server
        .listen
        .parse()
        .map_err(|e| {
            MetricsError::BadRequest(format!("server.listen must be a valid SocketAddr: {e}"))
        })?;

    let state = app_state::AppState::new(cfg)?;

    match state.restore() {
        Ok(Some(LoadOutcome::Loaded { gauges, counters })) => {
            tracing::info!(gauges, counters, "snapshot restored");
        }
        Ok(Some(LoadOutcome::Missing)) => {
            tracing::info!(
                path = %state.snapshot_file().path().display(),
                "no snapshot file, starting empty"
            );
        }
        Ok(None) => {}
        Err(e) => {
            tracing::error!(error = %e, "snapshot restore failed");
            return Err(e);
        }
    }

    let saver = state.spawn_snapshot_saver();
    let app = router::build_router(state.clone());

    tracing::info!(%listen, "metricsd starting");
    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .map_err(|e| MetricsError::Internal(format!("failed to bind {listen}: {e}")))?;

    let draining = state.clone();
    let grace = state.cfg().server.drain_grace();
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutdown requested");
            draining.drain(grace).await;
        })
        .await
        .map_err(|e| MetricsError::Internal(format!("server failed: {e}")))?;

    state.stop_background();
    if let Err(e) = saver.await {
        tracing::warn!(error = %e, "snapshot saver task ended abnormally");
    }
    tracing::info!("metricsd stopped");
    Ok(())
}
