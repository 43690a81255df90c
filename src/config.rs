//! Settings that change how transactions are recorded.

use time::{Date, PrimitiveDateTime, Time};

/// Controls how a date and an optional time of day become a transaction's `occurred_at`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerConfig {
    /// Whether to keep the time of day. When `false`, every transaction is
    /// recorded at midnight on its date.
    pub record_time_of_day: bool,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            record_time_of_day: true,
        }
    }
}

impl LedgerConfig {
    /// Combine `date` and `time` into the date-time to store.
    ///
    /// Sub-second precision is dropped since the ledger stores whole seconds.
    pub fn occurred_at(&self, date: Date, time: Option<Time>) -> PrimitiveDateTime {
        let time = match time {
            Some(time) if self.record_time_of_day => time.replace_nanosecond(0).unwrap_or(time),
            _ => Time::MIDNIGHT,
        };

        PrimitiveDateTime::new(date, time)
    }
}
