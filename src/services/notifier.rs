//! Notification collaborators: one-way delivery of emitted signals.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::error::NotifyError;
use crate::models::signal::Signal;

/// Rendered form of a signal, as shown to the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationMessage {
    pub id: String,
    pub title: String,
    pub body: String,
    /// Signal id, so repeated deliveries of one signal collapse.
    pub tag: String,
    pub url: String,
    pub timestamp: i64,
}

impl NotificationMessage {
    pub fn from_signal(signal: &Signal, trade_url: &str) -> Self {
        Self {
            id: format!("notification_{}", signal.id),
            title: format!("{} {} signal", signal.symbol, signal.direction),
            body: format!(
                "Confidence {}% | Entry {} | Expiry {} min",
                signal.confidence,
                signal.symbol.format_price(signal.entry_price),
                signal.expiry_time
            ),
            tag: signal.id.clone(),
            url: trade_url.to_string(),
            timestamp: signal.created_at,
        }
    }
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, signal: &Signal) -> Result<(), NotifyError>;

    fn name(&self) -> &'static str;
}

/// Writes each notification to the log.
pub struct LogNotifier {
    trade_url: String,
}

impl LogNotifier {
    pub fn new(trade_url: impl Into<String>) -> Self {
        Self {
            trade_url: trade_url.into(),
        }
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, signal: &Signal) -> Result<(), NotifyError> {
        let message = NotificationMessage::from_signal(signal, &self.trade_url);
        info!(
            tag = %message.tag,
            url = %message.url,
            title = %message.title,
            "{}",
            message.body
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "log"
    }
}

/// Publishes signals on a broadcast channel (feeds the SSE stream).
#[derive(Clone)]
pub struct BroadcastNotifier {
    sender: broadcast::Sender<Signal>,
}

impl BroadcastNotifier {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Signal> {
        self.sender.subscribe()
    }
}

#[async_trait]
impl Notifier for BroadcastNotifier {
    async fn notify(&self, signal: &Signal) -> Result<(), NotifyError> {
        self.sender
            .send(signal.clone())
            .map(|_| ())
            .map_err(|_| NotifyError::NoSubscribers)
    }

    fn name(&self) -> &'static str {
        "broadcast"
    }
}

/// Fans a signal out to every registered notifier. Failures are logged and
/// swallowed.
#[derive(Clone, Default)]
pub struct NotifierSet {
    notifiers: Vec<Arc<dyn Notifier>>,
}

impl NotifierSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifiers.push(notifier);
        self
    }

    pub fn len(&self) -> usize {
        self.notifiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notifiers.is_empty()
    }

    pub async fn notify_all(&self, signal: &Signal) {
        for notifier in &self.notifiers {
            match notifier.notify(signal).await {
                Ok(()) => {}
                Err(NotifyError::NoSubscribers) => {
                    debug!(notifier = notifier.name(), "No subscribers for signal {}", signal.id);
                }
                Err(e) => {
                    warn!(notifier = notifier.name(), error = %e, "Notification delivery failed");
                }
            }
        }
    }
}
