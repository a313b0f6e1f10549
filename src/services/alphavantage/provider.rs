//! Alpha Vantage implementation of the market data collaborator

use async_trait::async_trait;

use super::client::AlphaVantageClient;
use super::messages::{parse_exchange_rate, parse_time_series};
use crate::config::AlphaVantageConfig;
use crate::error::MarketDataError;
use crate::models::market::{Bar, Quote, TimeFrame, TradingPair, VenueStatus};
use crate::services::market_data::{resolve_pair, MarketDataProvider};

/// `compact` responses carry the latest 100 points.
const COMPACT_OUTPUT_SIZE: usize = 100;

pub struct AlphaVantageProvider {
    client: AlphaVantageClient,
}

impl AlphaVantageProvider {
    pub fn new(config: &AlphaVantageConfig) -> Result<Self, MarketDataError> {
        Ok(Self {
            client: AlphaVantageClient::new(config)?,
        })
    }

    async fn fetch_rate(&self, pair: TradingPair) -> Result<Quote, MarketDataError> {
        let (from, to) = pair.currencies();
        let body = self
            .client
            .query(&[
                ("function", "CURRENCY_EXCHANGE_RATE".to_string()),
                ("from_currency", from.to_string()),
                ("to_currency", to.to_string()),
            ])
            .await?;
        parse_exchange_rate(&body)
    }
}

/// Provider interval for intraday timeframes; `None` means the daily series.
/// There is no 4h series, so it falls back to hourly bars.
pub fn intraday_interval(timeframe: TimeFrame) -> Option<&'static str> {
    match timeframe {
        TimeFrame::M1 => Some("1min"),
        TimeFrame::M5 => Some("5min"),
        TimeFrame::M15 => Some("15min"),
        TimeFrame::M30 => Some("30min"),
        TimeFrame::H1 | TimeFrame::H4 => Some("60min"),
        TimeFrame::D1 => None,
    }
}

#[async_trait]
impl MarketDataProvider for AlphaVantageProvider {
    async fn get_bars(
        &self,
        symbol: &str,
        timeframe: TimeFrame,
        count: usize,
    ) -> Result<Vec<Bar>, MarketDataError> {
        let pair = resolve_pair(symbol)?;
        let (from, to) = pair.currencies();
        let output_size = if count <= COMPACT_OUTPUT_SIZE {
            "compact"
        } else {
            "full"
        };

        let mut params = vec![
            ("from_symbol", from.to_string()),
            ("to_symbol", to.to_string()),
            ("outputsize", output_size.to_string()),
        ];
        match intraday_interval(timeframe) {
            Some(interval) => {
                params.push(("function", "FX_INTRADAY".to_string()));
                params.push(("interval", interval.to_string()));
            }
            None => params.push(("function", "FX_DAILY".to_string())),
        }

        let body = self.client.query(&params).await?;
        parse_time_series(&body, count)
    }

    async fn get_latest_quote(&self, symbol: &str) -> Result<Quote, MarketDataError> {
        let pair = resolve_pair(symbol)?;
        self.fetch_rate(pair).await
    }

    /// The venue counts as active whenever the USD/JPY rate can be fetched.
    async fn get_venue_status(&self) -> Result<VenueStatus, MarketDataError> {
        self.fetch_rate(TradingPair::UsdJpy).await?;
        Ok(VenueStatus::active())
    }

    fn name(&self) -> &'static str {
        "alphavantage"
    }
}
