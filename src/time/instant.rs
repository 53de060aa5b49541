//! Implementation of the [`Time`] type

use core::{
    fmt::Display,
    ops::{Add, AddAssign, Sub, SubAssign},
};

use az::Az;
use fixed::types::U96F32;

use super::Duration;
use crate::datastructures::common::{TimeInterval, WireTimestamp};

/// Time represents a specific moment in time, as measured by a clock that
/// follows the gPTP epoch.
///
/// The starting 0 point depends on the timescale being used by the domain,
/// but for the PTP timescale it is 1 January 1970 00:00:00 TAI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Time {
    /// Time in nanos
    inner: U96F32,
}

impl Time {
    /// Create an instance with the given amount of seconds from the origin
    pub fn from_secs(secs: u64) -> Self {
        let inner = U96F32::from_num(secs) * 1_000_000_000;
        Self { inner }
    }

    /// Create an instance with the given amount of milliseconds from the
    /// origin
    pub fn from_millis(millis: u64) -> Self {
        let inner = U96F32::from_num(millis) * 1_000_000;
        Self { inner }
    }

    /// Create an instance with the given amount of microseconds from the
    /// origin
    pub fn from_micros(micros: u64) -> Self {
        let inner = U96F32::from_num(micros) * 1_000;
        Self { inner }
    }

    /// Create an instance with the given amount of nanoseconds from the origin
    pub fn from_nanos(nanos: u64) -> Self {
        let inner = U96F32::from_num(nanos);
        Self { inner }
    }

    /// Create an instance with the given amount of nanoseconds from the
    /// origin, with fractional resolution
    pub fn from_fixed_nanos<F: Into<U96F32>>(nanos: F) -> Self {
        Self {
            inner: nanos.into(),
        }
    }

    /// Create an instance from whole seconds and nanoseconds within the second
    pub fn from_secs_nanos(secs: u64, nanos: u32) -> Self {
        let inner = U96F32::from_num(secs) * 1_000_000_000 + U96F32::from_num(nanos);
        Self { inner }
    }

    /// Get the total amount of nanoseconds since the origin
    pub fn nanos(&self) -> U96F32 {
        self.inner
    }

    /// Get all the whole seconds of the instant
    pub fn secs(&self) -> u64 {
        (self.inner / 1_000_000_000).to_num()
    }

    /// Get the nanoseconds within the current second
    pub fn subsec_nanos(&self) -> u32 {
        (self.inner % 1_000_000_000).to_num()
    }

    /// The sub-nanosecond part of this time, as a correction-field interval
    pub fn subnano(&self) -> TimeInterval {
        // Keep the top 16 bits of the fraction in the Q48.16 representation
        let bits = (self.inner.frac().to_bits() >> 16) as i64;
        TimeInterval(fixed::types::I48F16::from_bits(bits))
    }

}

impl From<WireTimestamp> for Time {
    fn from(ts: WireTimestamp) -> Self {
        Self::from_secs_nanos(ts.seconds, ts.nanos)
    }
}

impl From<Time> for WireTimestamp {
    fn from(time: Time) -> Self {
        WireTimestamp {
            seconds: time.secs(),
            nanos: time.subsec_nanos(),
        }
    }
}

impl Add<Duration> for Time {
    type Output = Time;

    fn add(self, rhs: Duration) -> Self::Output {
        if rhs.nanos().is_negative() {
            let bits = (self.inner.to_bits() as i128).saturating_sub(-rhs.nanos().to_bits());
            Time {
                inner: U96F32::from_bits(bits.max(0) as u128),
            }
        } else {
            Time {
                inner: self
                    .inner
                    .saturating_add(U96F32::from_bits(rhs.nanos().to_bits() as u128)),
            }
        }
    }
}

impl AddAssign<Duration> for Time {
    fn add_assign(&mut self, rhs: Duration) {
        *self = *self + rhs;
    }
}

impl Sub<Duration> for Time {
    type Output = Time;

    fn sub(self, rhs: Duration) -> Self::Output {
        self + -rhs
    }
}

impl SubAssign<Duration> for Time {
    fn sub_assign(&mut self, rhs: Duration) {
        *self = *self - rhs;
    }
}

impl Sub<Time> for Time {
    type Output = Duration;

    fn sub(self, rhs: Time) -> Self::Output {
        let lhs = self.inner.to_bits() as i128;
        let rhs = rhs.inner.to_bits() as i128;
        Duration::from_fixed_nanos(fixed::types::I96F32::from_bits(lhs - rhs))
    }
}

impl Display for Time {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.inner.az::<f64>() / 1e9)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values() {
        assert_eq!(Time::from_secs(10).nanos(), 10_000_000_000u64);
        assert_eq!(Time::from_millis(10).nanos(), 10_000_000u64);
        assert_eq!(Time::from_micros(10).nanos(), 10_000u64);
        assert_eq!(Time::from_nanos(10).nanos(), 10u64);

        let time = Time::from_secs_nanos(5, 500_000_000);
        assert_eq!(time.secs(), 5);
        assert_eq!(time.subsec_nanos(), 500_000_000);
    }

    #[test]
    fn arithmetic() {
        let a = Time::from_micros(100);
        let b = Time::from_micros(150);

        assert_eq!(b - a, Duration::from_micros(50));
        assert_eq!(a - b, -Duration::from_micros(50));
        assert_eq!(a + Duration::from_micros(50), b);
        assert_eq!(b - Duration::from_micros(50), a);
    }

    #[test]
    fn subtraction_saturates_at_origin() {
        let t = Time::from_nanos(10) - Duration::from_nanos(20);
        assert_eq!(t, Time::from_nanos(0));
    }

    #[test]
    fn wire_round_trip() {
        let ts = WireTimestamp {
            seconds: 1169232218,
            nanos: 174389936,
        };
        assert_eq!(WireTimestamp::from(Time::from(ts)), ts);
    }
}
