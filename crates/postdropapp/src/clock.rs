//! Time source for default dates and ledger timestamps.
//!
//! Everything that reads "now" goes through [`Clock`] so tests can pin the
//! date and get byte-identical identifiers and headers.

use chrono::{DateTime, FixedOffset, Local};

/// Header date format: `2024-01-15 09:30:00 +0100`.
pub const HEADER_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S %z";

/// Date prefix used in identifiers.
pub const IDENTIFIER_DATE_FORMAT: &str = "%Y-%m-%d";

pub trait Clock {
    fn now(&self) -> DateTime<FixedOffset>;

    fn today(&self) -> String {
        self.now().format(IDENTIFIER_DATE_FORMAT).to_string()
    }

    fn header_timestamp(&self) -> String {
        self.now().format(HEADER_DATE_FORMAT).to_string()
    }
}

/// Wall clock in the local timezone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Local::now().fixed_offset()
    }
}

/// A clock stuck at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<FixedOffset>);

impl FixedClock {
    /// Parses an RFC 3339 timestamp, e.g. `2024-01-15T09:30:00+01:00`.
    pub fn parse(rfc3339: &str) -> Option<Self> {
        DateTime::parse_from_rfc3339(rfc3339).ok().map(Self)
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<FixedOffset> {
        self.0
    }
}
