//! Trading-session gating: daily windows, news blackouts and weekends.

use chrono::{DateTime, Datelike, FixedOffset, Offset, Timelike, Utc, Weekday};
use std::fmt;

const MINUTES_PER_DAY: u32 = 24 * 60;

/// Tokyo, the reference timezone of the default schedule.
pub const DEFAULT_UTC_OFFSET_HOURS: i32 = 9;

/// Inclusive `[start, end]` minute-of-day windows: 09:00-11:00 and 15:00-17:00.
pub const DEFAULT_WINDOWS: [(u32, u32); 2] = [(9 * 60, 11 * 60), (15 * 60, 17 * 60)];

/// Scheduled releases to stay away from, as minute-of-day.
pub const DEFAULT_BLACKOUTS: [u32; 6] = [
    8 * 60 + 30,
    10 * 60 + 30,
    16 * 60 + 30,
    18 * 60 + 30,
    21 * 60 + 30,
    23 * 60 + 30,
];

pub const DEFAULT_BLACKOUT_MARGIN_MINUTES: u32 = 30;

/// Why the session refused a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionBlock {
    OutsideWindow,
    NewsBlackout,
    Weekend,
}

impl fmt::Display for SessionBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionBlock::OutsideWindow => f.write_str("outside trading window"),
            SessionBlock::NewsBlackout => f.write_str("news blackout"),
            SessionBlock::Weekend => f.write_str("weekend"),
        }
    }
}

/// Static daily schedule evaluated in a fixed reference timezone.
#[derive(Debug, Clone)]
pub struct TradingSession {
    offset: FixedOffset,
    windows: Vec<(u32, u32)>,
    blackouts: Vec<u32>,
    blackout_margin: u32,
}

impl TradingSession {
    /// Default schedule at the given UTC offset. `None` if the offset is out of range.
    pub fn new(utc_offset_hours: i32) -> Option<Self> {
        let offset = FixedOffset::east_opt(utc_offset_hours * 3600)?;
        Some(Self {
            offset,
            windows: DEFAULT_WINDOWS.to_vec(),
            blackouts: DEFAULT_BLACKOUTS.to_vec(),
            blackout_margin: DEFAULT_BLACKOUT_MARGIN_MINUTES,
        })
    }

    pub fn with_windows(mut self, windows: Vec<(u32, u32)>) -> Self {
        self.windows = windows;
        self
    }

    pub fn with_blackouts(mut self, blackouts: Vec<u32>, margin_minutes: u32) -> Self {
        self.blackouts = blackouts;
        self.blackout_margin = margin_minutes;
        self
    }

    fn local(&self, now: DateTime<Utc>) -> DateTime<FixedOffset> {
        now.with_timezone(&self.offset)
    }

    fn minute_of_day(&self, now: DateTime<Utc>) -> u32 {
        let local = self.local(now);
        local.hour() * 60 + local.minute()
    }

    /// Inside one of the daily windows (bounds inclusive).
    pub fn is_optimal_trading_time(&self, now: DateTime<Utc>) -> bool {
        let minute = self.minute_of_day(now);
        self.windows
            .iter()
            .any(|&(start, end)| minute >= start && minute <= end)
    }

    pub fn is_weekend(&self, now: DateTime<Utc>) -> bool {
        matches!(self.local(now).weekday(), Weekday::Sat | Weekday::Sun)
    }

    /// Within the margin of any blackout time, measured around the clock.
    pub fn is_news_blackout(&self, now: DateTime<Utc>) -> bool {
        let minute = self.minute_of_day(now);
        self.blackouts.iter().any(|&blackout| {
            let diff = minute.abs_diff(blackout);
            diff.min(MINUTES_PER_DAY - diff) <= self.blackout_margin
        })
    }

    pub fn should_avoid_news(&self, now: DateTime<Utc>) -> bool {
        self.is_weekend(now) || self.is_news_blackout(now)
    }

    /// Window first, then weekend, then blackout.
    pub fn check(&self, now: DateTime<Utc>) -> Result<(), SessionBlock> {
        if !self.is_optimal_trading_time(now) {
            return Err(SessionBlock::OutsideWindow);
        }
        if self.is_weekend(now) {
            return Err(SessionBlock::Weekend);
        }
        if self.is_news_blackout(now) {
            return Err(SessionBlock::NewsBlackout);
        }
        Ok(())
    }
}

impl Default for TradingSession {
    fn default() -> Self {
        Self {
            offset: FixedOffset::east_opt(DEFAULT_UTC_OFFSET_HOURS * 3600)
                .unwrap_or_else(|| Utc.fix()),
            windows: DEFAULT_WINDOWS.to_vec(),
            blackouts: DEFAULT_BLACKOUTS.to_vec(),
            blackout_margin: DEFAULT_BLACKOUT_MARGIN_MINUTES,
        }
    }
}
