//! HTTP dashboard API using Axum

use axum::{
    extract::{Path, Query, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Json, Response,
    },
    routing::{get, post},
    Router,
};
use futures_util::stream::{self, Stream};
use serde::Deserialize;
use serde_json::{json, Value};
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::broadcast::error::RecvError;
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{error, info, Level};

use crate::core::runtime::SignalRuntime;
use crate::core::scheduler::SignalScheduler;
use crate::error::MarketDataError;
use crate::metrics::Metrics;
use crate::services::notifier::BroadcastNotifier;

const DEFAULT_SIGNAL_LIMIT: usize = 50;

#[derive(Clone)]
pub struct AppState {
    pub runtime: Arc<SignalRuntime>,
    pub scheduler: Arc<SignalScheduler>,
    pub metrics: Arc<Metrics>,
    pub events: BroadcastNotifier,
    pub start_time: Arc<Instant>,
}

impl AppState {
    pub fn new(
        scheduler: Arc<SignalScheduler>,
        metrics: Arc<Metrics>,
        events: BroadcastNotifier,
    ) -> Self {
        Self {
            runtime: scheduler.runtime().clone(),
            scheduler,
            metrics,
            events,
            start_time: Arc::new(Instant::now()),
        }
    }
}

pub async fn health_check(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "uptime_seconds": state.start_time.elapsed().as_secs(),
        "service": "fxsignal"
    }))
}

pub async fn metrics_handler(State(state): State<AppState>) -> Result<String, StatusCode> {
    state
        .metrics
        .export()
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}

/// Middleware to track HTTP request metrics
async fn metrics_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    state.metrics.http_requests_in_flight.inc();
    let response = next.run(request).await;
    let status = response.status();
    let duration = start.elapsed();
    state.metrics.http_requests_in_flight.dec();

    state.metrics.http_requests_total.inc();
    state
        .metrics
        .http_request_duration_seconds
        .observe(duration.as_secs_f64());

    if status.is_server_error() {
        error!(
            method = %method,
            path = %path,
            status = %status,
            duration_ms = duration.as_millis(),
            "HTTP request error"
        );
    }

    response
}

async fn get_status(State(state): State<AppState>) -> Json<Value> {
    let scheduler = state.runtime.scheduler_state().await;
    let market = state.runtime.market_state().await;
    let config = state.runtime.config();
    Json(json!({
        "scheduler": scheduler,
        "isConnected": market.is_connected,
        "lastApiError": market.last_error,
        "venueActive": market.venue_active,
        "symbol": config.symbol,
        "timeframe": config.timeframe,
        "precisionMode": config.precision_mode,
        "provider": state.runtime.provider().name(),
        "signalCount": state.runtime.signal_count().await,
    }))
}

async fn get_market(State(state): State<AppState>) -> Json<Value> {
    let market = state.runtime.market_state().await;
    let config = state.runtime.config();
    Json(json!({
        "symbol": config.symbol,
        "displayName": config.symbol.display_name(),
        "timeframe": config.timeframe,
        "barCount": market.bars.len(),
        "lastBar": market.bars.last(),
        "currentPrice": market.current_price,
        "indicators": market.indicators,
        "isConnected": market.is_connected,
        "lastUpdate": market.last_update,
    }))
}

async fn get_quote(State(state): State<AppState>, Path(symbol): Path<String>) -> Response {
    match state.runtime.provider().get_latest_quote(&symbol).await {
        Ok(quote) => Json(quote).into_response(),
        Err(e @ MarketDataError::UnsupportedSymbol(_)) => {
            (StatusCode::BAD_REQUEST, Json(json!({ "error": e.to_string() }))).into_response()
        }
        Err(e) => {
            error!(symbol = %symbol, error = %e, "Quote request failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "error": e.to_string() })),
            )
                .into_response()
        }
    }
}

#[derive(Debug, Deserialize)]
struct SignalQuery {
    limit: Option<usize>,
}

async fn list_signals(
    State(state): State<AppState>,
    Query(params): Query<SignalQuery>,
) -> Json<Value> {
    let limit = params.limit.unwrap_or(DEFAULT_SIGNAL_LIMIT);
    Json(json!(state.runtime.recent_signals(limit).await))
}

async fn clear_signals(State(state): State<AppState>) -> StatusCode {
    state.runtime.clear_signals().await;
    StatusCode::NO_CONTENT
}

/// One `signal` event per emitted signal. Lagging clients skip what they missed.
async fn stream_signals(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    let receiver = state.events.subscribe();
    let events = stream::unfold(receiver, |mut receiver| async move {
        loop {
            match receiver.recv().await {
                Ok(signal) => {
                    let event = Event::default()
                        .event("signal")
                        .id(signal.id.clone())
                        .json_data(&signal);
                    return Some((event, receiver));
                }
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => return None,
            }
        }
    });
    Sse::new(events).keep_alive(KeepAlive::default())
}

async fn start_scheduler(State(state): State<AppState>) -> Json<Value> {
    state.scheduler.start().await;
    Json(json!({ "isRunning": state.scheduler.is_running().await }))
}

async fn stop_scheduler(State(state): State<AppState>) -> Json<Value> {
    state.scheduler.stop().await;
    Json(json!({ "isRunning": state.scheduler.is_running().await }))
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_handler))
        .route("/api/status", get(get_status))
        .route("/api/market", get(get_market))
        .route("/api/quote/{symbol}", get(get_quote))
        .route("/api/signals", get(list_signals).delete(clear_signals))
        .route("/api/signals/stream", get(stream_signals))
        .route("/api/scheduler/start", post(start_scheduler))
        .route("/api/scheduler/stop", post(stop_scheduler))
        .layer(
            ServiceBuilder::new()
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(DefaultMakeSpan::new().level(Level::DEBUG))
                        .on_request(DefaultOnRequest::new().level(Level::DEBUG))
                        .on_response(DefaultOnResponse::new().level(Level::DEBUG)),
                )
                .layer(axum::middleware::from_fn_with_state(
                    state.clone(),
                    metrics_middleware,
                ))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

pub async fn start_server<F>(
    port: u16,
    state: AppState,
    shutdown: F,
) -> Result<(), Box<dyn std::error::Error>>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = create_router(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;

    info!(port = port, "HTTP server listening on port {}", port);
    info!(
        "Metrics endpoint available at http://0.0.0.0:{}/metrics",
        port
    );
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}
