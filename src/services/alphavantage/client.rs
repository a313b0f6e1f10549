//! Paced, retrying HTTP client for the Alpha Vantage query endpoint

use backon::{ExponentialBuilder, Retryable};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};
use tracing::{debug, warn};

use super::messages::check_api_error;
use crate::config::AlphaVantageConfig;
use crate::error::MarketDataError;

pub struct AlphaVantageClient {
    http: Client,
    endpoint: String,
    api_key: String,
    min_request_interval: Duration,
    max_retries: usize,
    retry_min_delay: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl AlphaVantageClient {
    pub fn new(config: &AlphaVantageConfig) -> Result<Self, MarketDataError> {
        let http = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            http,
            endpoint: format!("{}/query", config.base_url.trim_end_matches('/')),
            api_key: config.api_key.clone(),
            min_request_interval: config.min_request_interval,
            max_retries: config.max_retries,
            retry_min_delay: config.retry_min_delay,
            last_request: Mutex::new(None),
        })
    }

    /// GET `/query` with the given parameters, retrying rate limits and
    /// transport failures with exponential backoff.
    pub async fn query(&self, params: &[(&str, String)]) -> Result<Value, MarketDataError> {
        let backoff = ExponentialBuilder::default()
            .with_min_delay(self.retry_min_delay)
            .with_max_delay(self.retry_min_delay * 16)
            .with_max_times(self.max_retries);

        (|| self.send_once(params))
            .retry(backoff)
            .when(|e: &MarketDataError| e.is_retryable())
            .notify(|e: &MarketDataError, delay: Duration| {
                warn!(
                    error = %e,
                    delay_ms = delay.as_millis() as u64,
                    "Alpha Vantage request failed, retrying"
                );
            })
            .await
    }

    async fn send_once(&self, params: &[(&str, String)]) -> Result<Value, MarketDataError> {
        self.pace().await;

        let function = params
            .iter()
            .find(|(key, _)| *key == "function")
            .map(|(_, value)| value.as_str())
            .unwrap_or("unknown");
        debug!(function = %function, "Alpha Vantage request");

        let response = self
            .http
            .get(&self.endpoint)
            .query(params)
            .query(&[("apikey", self.api_key.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(MarketDataError::Status {
                status: status.as_u16(),
            });
        }

        let body: Value = response.json().await?;
        check_api_error(&body)?;
        Ok(body)
    }

    /// Hold requests apart by at least the configured interval.
    async fn pace(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < self.min_request_interval {
                sleep(self.min_request_interval - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }
}
