//! Forex binary-option signal service: indicator engine, rule-based signal
//! decision, session-gated scheduler and a small dashboard API.

pub mod common;
pub mod config;
pub mod core;
pub mod error;
pub mod indicators;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod services;
pub mod signals;
