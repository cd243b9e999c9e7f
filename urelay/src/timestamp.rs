//! Unix timestamps for relay request deadlines.
//!
//! A relay request carries a `deadline` after which the relay contract must
//! reject it. [`UnixTimestamp`] is the client-side representation of that
//! value: whole seconds since the Unix epoch, converted to `uint256` only when
//! the request is encoded for signing.

use std::fmt::{Display, Formatter};
use std::ops::Add;
use std::time::SystemTime;

use alloy_primitives::U256;

/// Seconds since the Unix epoch (1970-01-01T00:00:00Z).
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Ord, Eq, Hash)]
pub struct UnixTimestamp(u64);

impl Display for UnixTimestamp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Add<u64> for UnixTimestamp {
    type Output = Self;

    /// Saturates at `u64::MAX` instead of wrapping.
    fn add(self, rhs: u64) -> Self::Output {
        Self(self.0.saturating_add(rhs))
    }
}

impl From<UnixTimestamp> for U256 {
    fn from(value: UnixTimestamp) -> Self {
        Self::from(value.0)
    }
}

impl UnixTimestamp {
    /// Creates a timestamp from raw seconds.
    #[must_use]
    pub const fn from_secs(secs: u64) -> Self {
        Self(secs)
    }

    /// Returns the current system time.
    ///
    /// # Panics
    ///
    /// Panics if the system clock reports a time before the Unix epoch.
    #[must_use]
    pub fn now() -> Self {
        let now = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .expect("SystemTime before UNIX epoch?!?")
            .as_secs();
        Self(now)
    }

    /// Returns the raw seconds.
    #[must_use]
    pub const fn as_secs(&self) -> u64 {
        self.0
    }

    /// Deadline `ttl_seconds` after `self`.
    #[must_use]
    pub const fn deadline_after(self, ttl_seconds: u64) -> Self {
        Self(self.0.saturating_add(ttl_seconds))
    }

    /// Whether a deadline at `self` has passed at `now`.
    ///
    /// The relay contract accepts a request while `now <= deadline`.
    #[must_use]
    pub const fn is_expired_at(&self, now: Self) -> bool {
        now.0 > self.0
    }

    /// Converts an on-chain `uint256` deadline, saturating values beyond `u64`.
    #[must_use]
    pub fn from_u256_saturating(value: U256) -> Self {
        Self(u64::try_from(value).unwrap_or(u64::MAX))
    }
}
