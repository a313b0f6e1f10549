//! Prometheus metrics for the HTTP API and the signal scheduler.

use prometheus::{
    Encoder, Gauge, Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};

pub struct Metrics {
    registry: Registry,
    pub http_requests_total: IntCounter,
    pub http_request_duration_seconds: Histogram,
    pub http_requests_in_flight: IntGauge,
    pub signal_ticks_total: IntCounter,
    pub signal_ticks_skipped_total: IntCounterVec,
    pub signals_emitted_total: IntCounter,
    pub market_data_failures_total: IntCounter,
    pub market_data_connected: Gauge,
    pub venue_active: Gauge,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let http_requests_total =
            IntCounter::new("http_requests_total", "Total number of HTTP requests")?;
        let http_request_duration_seconds = Histogram::with_opts(HistogramOpts::new(
            "http_request_duration_seconds",
            "HTTP request latency in seconds",
        ))?;
        let http_requests_in_flight =
            IntGauge::new("http_requests_in_flight", "HTTP requests currently being served")?;
        let signal_ticks_total =
            IntCounter::new("signal_ticks_total", "Signal-generation ticks executed")?;
        let signal_ticks_skipped_total = IntCounterVec::new(
            Opts::new(
                "signal_ticks_skipped_total",
                "Signal-generation ticks skipped before evaluation",
            ),
            &["reason"],
        )?;
        let signals_emitted_total =
            IntCounter::new("signals_emitted_total", "Signals appended to the signal log")?;
        let market_data_failures_total = IntCounter::new(
            "market_data_failures_total",
            "Failed market-data refreshes",
        )?;
        let market_data_connected = Gauge::new(
            "market_data_connected",
            "1 when the last market-data refresh succeeded",
        )?;
        let venue_active = Gauge::new("venue_active", "1 when the trading venue is reported active")?;

        registry.register(Box::new(http_requests_total.clone()))?;
        registry.register(Box::new(http_request_duration_seconds.clone()))?;
        registry.register(Box::new(http_requests_in_flight.clone()))?;
        registry.register(Box::new(signal_ticks_total.clone()))?;
        registry.register(Box::new(signal_ticks_skipped_total.clone()))?;
        registry.register(Box::new(signals_emitted_total.clone()))?;
        registry.register(Box::new(market_data_failures_total.clone()))?;
        registry.register(Box::new(market_data_connected.clone()))?;
        registry.register(Box::new(venue_active.clone()))?;

        Ok(Self {
            registry,
            http_requests_total,
            http_request_duration_seconds,
            http_requests_in_flight,
            signal_ticks_total,
            signal_ticks_skipped_total,
            signals_emitted_total,
            market_data_failures_total,
            market_data_connected,
            venue_active,
        })
    }

    /// Render every registered metric in the Prometheus text format.
    pub fn export(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
