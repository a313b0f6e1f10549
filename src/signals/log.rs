//! Append-only, bounded record of emitted signals.

use std::collections::VecDeque;

use crate::models::signal::Signal;

pub const DEFAULT_SIGNAL_LOG_CAPACITY: usize = 500;

/// Signals in emission order. Once full, the oldest entries are dropped.
#[derive(Debug, Clone)]
pub struct SignalLog {
    signals: VecDeque<Signal>,
    capacity: usize,
}

impl SignalLog {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_SIGNAL_LOG_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            signals: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn push(&mut self, signal: Signal) {
        self.signals.push_back(signal);
        while self.signals.len() > self.capacity {
            self.signals.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.signals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }

    pub fn last(&self) -> Option<&Signal> {
        self.signals.back()
    }

    /// The newest `limit` signals, oldest first.
    pub fn recent(&self, limit: usize) -> Vec<Signal> {
        let skip = self.signals.len().saturating_sub(limit);
        self.signals.iter().skip(skip).cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Signal> {
        self.signals.iter()
    }

    pub fn clear(&mut self) {
        self.signals.clear();
    }
}

impl Default for SignalLog {
    fn default() -> Self {
        Self::new()
    }
}
