//! Alpha Vantage FX backend

pub mod client;
pub mod messages;
pub mod provider;

pub use client::AlphaVantageClient;
pub use provider::AlphaVantageProvider;
