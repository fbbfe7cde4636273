//! Nanosecond-precision instants

use std::fmt;
use std::num::ParseIntError;

const NANOS_PER_SEC: u64 = 1_000_000_000;
const NANOS_PER_MILLI: u64 = 1_000_000;

/// Point in time, stored as nanoseconds since the Unix epoch
///
/// Metric samples arrive as fractional seconds and keep full nanosecond
/// precision; persisted usage state only carries milliseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(u64);

impl Timestamp {
    /// The Unix epoch, used for freshly bootstrapped usage state
    pub const EPOCH: Timestamp = Timestamp(0);

    /// Create a timestamp from nanoseconds since the epoch
    pub fn from_nanos(nanos: u64) -> Self {
        Self(nanos)
    }

    /// Create a timestamp from milliseconds since the epoch
    pub fn from_millis(millis: u64) -> Self {
        Self(millis.saturating_mul(NANOS_PER_MILLI))
    }

    /// Convert fractional epoch seconds (as reported by Prometheus)
    ///
    /// The whole seconds and the fractional part are converted separately so
    /// the sub-second component keeps nanosecond precision. Non-finite or
    /// negative values collapse to the epoch.
    ///
    /// # Examples
    ///
    /// ```
    /// use lastused_domain::Timestamp;
    ///
    /// let ts = Timestamp::from_fractional_secs(1700000000.5);
    /// assert_eq!(ts.as_millis(), 1_700_000_000_500);
    /// ```
    pub fn from_fractional_secs(secs: f64) -> Self {
        if !secs.is_finite() || secs <= 0.0 {
            return Self::EPOCH;
        }
        let whole = secs.trunc();
        let nanos = ((secs - whole) * NANOS_PER_SEC as f64) as u64;
        Self((whole as u64).saturating_mul(NANOS_PER_SEC).saturating_add(nanos))
    }

    /// Parse the persisted representation (decimal epoch milliseconds)
    pub fn parse_millis(value: &str) -> Result<Self, ParseIntError> {
        value.parse::<u64>().map(Self::from_millis)
    }

    /// Nanoseconds since the epoch
    pub fn as_nanos(&self) -> u64 {
        self.0
    }

    /// Milliseconds since the epoch (truncating)
    pub fn as_millis(&self) -> u64 {
        self.0 / NANOS_PER_MILLI
    }

    /// True if this instant is strictly later than `other`
    pub fn is_after(&self, other: Timestamp) -> bool {
        self.0 > other.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:09}s", self.0 / NANOS_PER_SEC, self.0 % NANOS_PER_SEC)
    }
}
