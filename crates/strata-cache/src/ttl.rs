//! Time-to-live values with explicit units.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Lenient `get_expire` result when the backend call failed.
pub const EXPIRE_ERROR: i64 = -1;

/// Lenient `get_expire` result when the key does not exist.
pub const EXPIRE_MISSING: i64 = -2;

/// Lenient `get_expire` result when the key exists without a TTL.
pub const EXPIRE_PERSISTENT: i64 = -3;

/// Unit a TTL amount is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    Milliseconds,
    Seconds,
    Minutes,
    Hours,
    Days,
}

impl TimeUnit {
    const fn millis_per_unit(self) -> u64 {
        match self {
            Self::Milliseconds => 1,
            Self::Seconds => 1_000,
            Self::Minutes => 60_000,
            Self::Hours => 3_600_000,
            Self::Days => 86_400_000,
        }
    }

    /// Converts `amount` of this unit into a Duration, saturating on overflow.
    #[must_use]
    pub const fn to_duration(self, amount: u64) -> Duration {
        Duration::from_millis(amount.saturating_mul(self.millis_per_unit()))
    }

    /// Expresses a duration in this unit, rounding down.
    #[must_use]
    pub fn convert(self, duration: Duration) -> u64 {
        let millis = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
        millis / self.millis_per_unit()
    }
}

/// A cache time-to-live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ttl(Duration);

impl Ttl {
    /// Creates a TTL of `amount` in `unit`.
    #[must_use]
    pub const fn new(amount: u64, unit: TimeUnit) -> Self {
        Self(unit.to_duration(amount))
    }

    #[must_use]
    pub const fn millis(amount: u64) -> Self {
        Self::new(amount, TimeUnit::Milliseconds)
    }

    #[must_use]
    pub const fn seconds(amount: u64) -> Self {
        Self::new(amount, TimeUnit::Seconds)
    }

    #[must_use]
    pub const fn minutes(amount: u64) -> Self {
        Self::new(amount, TimeUnit::Minutes)
    }

    #[must_use]
    pub const fn as_duration(&self) -> Duration {
        self.0
    }

    /// A zero TTL would delete the entry instead of bounding its lifetime.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl From<Duration> for Ttl {
    fn from(duration: Duration) -> Self {
        Self(duration)
    }
}

/// Remaining lifetime of a key, as reported by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expiry {
    /// The key does not exist (or has already expired).
    Missing,
    /// The key exists and never expires.
    Persistent,
    /// The key expires after this duration.
    Remaining(Duration),
}

impl Expiry {
    /// Interprets a Redis `PTTL` reply (`-2` missing, `-1` persistent).
    #[must_use]
    pub fn from_pttl(millis: i64) -> Self {
        match millis {
            -1 => Self::Persistent,
            ms if ms >= 0 => Self::Remaining(Duration::from_millis(ms.unsigned_abs())),
            _ => Self::Missing,
        }
    }

    /// Renders the expiry in the lenient sentinel convention.
    ///
    /// Remaining lifetimes are reported in `unit`, rounded down; the sentinels
    /// are [`EXPIRE_MISSING`] and [`EXPIRE_PERSISTENT`].
    #[must_use]
    pub fn as_sentinel(self, unit: TimeUnit) -> i64 {
        match self {
            Self::Missing => EXPIRE_MISSING,
            Self::Persistent => EXPIRE_PERSISTENT,
            Self::Remaining(duration) => i64::try_from(unit.convert(duration)).unwrap_or(i64::MAX),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_units_are_explicit() {
        assert_eq!(Ttl::seconds(30).as_duration(), Duration::from_secs(30));
        assert_eq!(Ttl::millis(1_500).as_duration(), Duration::from_millis(1_500));
        assert_eq!(Ttl::minutes(2).as_duration(), Duration::from_secs(120));
        assert_eq!(Ttl::new(1, TimeUnit::Days).as_duration(), Duration::from_secs(86_400));
    }

    #[test]
    fn test_huge_amounts_saturate() {
        let ttl = Ttl::new(u64::MAX, TimeUnit::Hours);
        assert_eq!(ttl.as_duration(), Duration::from_millis(u64::MAX));
    }

    #[test]
    fn test_convert_rounds_down() {
        assert_eq!(TimeUnit::Seconds.convert(Duration::from_millis(2_999)), 2);
        assert_eq!(TimeUnit::Milliseconds.convert(Duration::from_millis(2_999)), 2_999);
        assert_eq!(TimeUnit::Minutes.convert(Duration::from_secs(59)), 0);
    }

    #[test]
    fn test_expiry_from_pttl() {
        assert_eq!(Expiry::from_pttl(-2), Expiry::Missing);
        assert_eq!(Expiry::from_pttl(-1), Expiry::Persistent);
        assert_eq!(Expiry::from_pttl(0), Expiry::Remaining(Duration::ZERO));
        assert_eq!(Expiry::from_pttl(1_200), Expiry::Remaining(Duration::from_millis(1_200)));
    }

    #[test]
    fn test_sentinels_are_distinct() {
        assert_eq!(Expiry::Missing.as_sentinel(TimeUnit::Seconds), EXPIRE_MISSING);
        assert_eq!(Expiry::Persistent.as_sentinel(TimeUnit::Seconds), EXPIRE_PERSISTENT);
        assert_ne!(EXPIRE_ERROR, EXPIRE_MISSING);
        assert_ne!(EXPIRE_ERROR, EXPIRE_PERSISTENT);
        assert_eq!(
            Expiry::Remaining(Duration::from_secs(90)).as_sentinel(TimeUnit::Minutes),
            1
        );
    }

    #[test]
    fn test_zero_ttl() {
        assert!(Ttl::seconds(0).is_zero());
        assert!(!Ttl::millis(1).is_zero());
    }
}
