//! Aggregation period derivation and the clock it reads from.

use chrono::{DateTime, Datelike, FixedOffset, Local, SecondsFormat, TimeZone, Utc};

/// Source of the current instant.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<FixedOffset>;
}

/// Wall clock of the host, in whatever zone the host is configured for.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Local::now().into()
    }
}

/// Clock frozen at a single instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<FixedOffset>);

impl FixedClock {
    pub fn new(instant: DateTime<FixedOffset>) -> Self {
        Self(instant)
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<FixedOffset> {
        self.0
    }
}

/// Calendar-month bucket `YYYY-MM` of `instant`, in the instant's own zone.
pub fn period_key<Tz: TimeZone>(instant: &DateTime<Tz>) -> String {
    format!("{:04}-{:02}", instant.year(), instant.month())
}

pub fn current_period(clock: &dyn Clock) -> String {
    period_key(&clock.now())
}

/// ISO-8601 UTC rendering with millisecond precision, e.g. `2026-03-15T12:00:00.000Z`.
pub fn timestamp<Tz: TimeZone>(instant: &DateTime<Tz>) -> String {
    instant
        .with_timezone(&Utc)
        .to_rfc3339_opts(SecondsFormat::Millis, true)
}
