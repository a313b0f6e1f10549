//! Core application primitives (runtime, scheduler, HTTP API)

pub mod clock;
pub mod http;
pub mod runtime;
pub mod scheduler;

pub use clock::{Clock, ManualClock, SystemClock};
pub use http::{create_router, start_server, AppState};
pub use runtime::{
    MarketState, RuntimeConfig, SchedulerState, SignalRuntime, SkipReason, TickOutcome,
};
pub use scheduler::SignalScheduler;
