//! FX Signal Service
//!
//! Runs the signal scheduler against the configured market-data backend and
//! serves the dashboard API, health check and metrics.

use dotenvy::dotenv;
use fxsignal::config::Config;
use fxsignal::core::{AppState, SignalRuntime, SignalScheduler, SystemClock};
use fxsignal::core::http::start_server;
use fxsignal::logging;
use fxsignal::metrics::Metrics;
use fxsignal::services::{build_provider, BroadcastNotifier, LogNotifier, NotifierSet};
use fxsignal::signals::TradingSession;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::oneshot;
use tracing::{error, info};

const SIGNAL_EVENT_CAPACITY: usize = 64;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env if present
    dotenv().ok();

    logging::init_logging();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            return Err(e.into());
        }
    };

    info!("Starting FX Signal Service");
    info!(environment = %config.environment, "Environment");
    info!(
        symbol = %config.symbol,
        timeframe = %config.timeframe,
        backend = %config.backend,
        precision_mode = config.precision_mode,
        "Signal configuration"
    );

    let clock = Arc::new(SystemClock);
    let provider = build_provider(&config, clock.clone())?;
    let metrics = Arc::new(Metrics::new()?);

    let session = TradingSession::new(config.session_utc_offset_hours).ok_or_else(|| {
        format!(
            "SESSION_UTC_OFFSET_HOURS out of range: {}",
            config.session_utc_offset_hours
        )
    })?;

    let events = BroadcastNotifier::new(SIGNAL_EVENT_CAPACITY);
    let notifiers = NotifierSet::new()
        .with(Arc::new(LogNotifier::new(config.trade_url.clone())))
        .with(Arc::new(events.clone()));

    let runtime = Arc::new(
        SignalRuntime::new(config.runtime_config(), provider, clock)
            .with_session(session)
            .with_notifiers(notifiers)
            .with_metrics(metrics.clone()),
    );
    let scheduler = Arc::new(SignalScheduler::new(runtime));
    scheduler.start().await;

    let state = AppState::new(scheduler.clone(), metrics, events);
    let port = config.port;
    info!(port = port, "HTTP Server: http://0.0.0.0:{}", port);

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let mut server_handle = tokio::spawn(async move {
        let shutdown = async {
            let _ = shutdown_rx.await;
        };
        if let Err(e) = start_server(port, state, shutdown).await {
            error!(error = %e, "HTTP server error");
        }
    });

    info!("Signal service started, waiting for shutdown signal...");
    let server_exited = tokio::select! {
        _ = signal::ctrl_c() => {
            info!("Shutting down signal service...");
            false
        }
        _ = &mut server_handle => {
            error!("HTTP server stopped");
            true
        }
    };

    scheduler.stop().await;
    if !server_exited {
        let _ = shutdown_tx.send(());
        let _ = server_handle.await;
    }
    info!("Signal service stopped");

    Ok(())
}
