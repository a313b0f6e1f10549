//! Interval-based scheduler driving the signal runtime

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info};

use super::runtime::SignalRuntime;

/// Runs the market refresh, venue check and signal tick as three
/// independent tokio tasks while in the Running state.
pub struct SignalScheduler {
    runtime: Arc<SignalRuntime>,
    handles: Arc<RwLock<Vec<JoinHandle<()>>>>,
}

impl SignalScheduler {
    pub fn new(runtime: Arc<SignalRuntime>) -> Self {
        Self {
            runtime,
            handles: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub fn runtime(&self) -> &Arc<SignalRuntime> {
        &self.runtime
    }

    /// Enter the Running state. Calling it while running restarts the tasks
    /// rather than scheduling them twice.
    pub async fn start(&self) {
        let mut handles = self.handles.write().await;
        for handle in handles.drain(..) {
            handle.abort();
        }

        let config = self.runtime.config().clone();

        let runtime = self.runtime.clone();
        handles.push(spawn_periodic(
            Duration::ZERO,
            config.market_refresh_interval,
            move || {
                let runtime = runtime.clone();
                async move {
                    // Failures are recorded on the runtime; the loop carries on.
                    let _ = runtime.refresh_market_data().await;
                }
            },
        ));

        let runtime = self.runtime.clone();
        handles.push(spawn_periodic(
            Duration::ZERO,
            config.venue_check_interval,
            move || {
                let runtime = runtime.clone();
                async move {
                    runtime.check_venue_status().await;
                }
            },
        ));

        let runtime = self.runtime.clone();
        let signal_interval = config.signal_interval();
        handles.push(spawn_periodic(signal_interval, signal_interval, move || {
            let runtime = runtime.clone();
            async move {
                runtime.generate_signal().await;
            }
        }));

        self.runtime.set_running(true).await;
        info!(
            symbol = %config.symbol,
            timeframe = %config.timeframe,
            signal_interval_secs = signal_interval.as_secs(),
            "SignalScheduler: started"
        );
    }

    /// Enter the Stopped state, cancelling every pending tick.
    pub async fn stop(&self) {
        let mut handles = self.handles.write().await;
        if handles.is_empty() {
            return;
        }
        for handle in handles.drain(..) {
            handle.abort();
        }
        self.runtime.set_running(false).await;
        info!("SignalScheduler: stopped");
    }

    pub async fn is_running(&self) -> bool {
        !self.handles.read().await.is_empty()
    }

    /// Number of live activity tasks (3 while running).
    pub async fn task_count(&self) -> usize {
        self.handles.read().await.len()
    }
}

/// Run `tick` every `period`, first after `delay`. Ticks of one task never
/// overlap; a slow tick delays the next one.
fn spawn_periodic<F, Fut>(delay: Duration, period: Duration, mut tick: F) -> JoinHandle<()>
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    tokio::spawn(async move {
        let mut timer = interval_at(Instant::now() + delay, period.max(Duration::from_millis(1)));
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            timer.tick().await;
            debug!(period_ms = period.as_millis() as u64, "SignalScheduler: tick");
            tick().await;
        }
    })
}
