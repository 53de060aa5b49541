use core::{
    fmt::Display,
    ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign},
};

use az::Az;
use fixed::types::I96F32;

use super::Interval;
use crate::datastructures::common::TimeInterval;

/// A duration is a signed amount of time in nanoseconds, with 32 bits of
/// sub-nanosecond resolution. It can be negative, to represent for example a
/// clock that is ahead of its master.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Duration {
    /// Time in nanos
    inner: I96F32,
}

impl Duration {
    /// A duration of zero length
    pub const ZERO: Duration = Duration {
        inner: I96F32::ZERO,
    };

    /// Create an instance with the given amount of seconds
    pub fn from_secs(secs: i64) -> Self {
        let inner = I96F32::from_num(secs) * 1_000_000_000;
        Self { inner }
    }

    /// Create an instance with the given amount of milliseconds
    pub fn from_millis(millis: i64) -> Self {
        let inner = I96F32::from_num(millis) * 1_000_000;
        Self { inner }
    }

    /// Create an instance with the given amount of microseconds
    pub fn from_micros(micros: i64) -> Self {
        let inner = I96F32::from_num(micros) * 1_000;
        Self { inner }
    }

    /// Create an instance with the given amount of nanoseconds
    pub fn from_nanos(nanos: i64) -> Self {
        let inner = I96F32::from_num(nanos);
        Self { inner }
    }

    /// Create an instance with the given amount of nanoseconds, with
    /// fractional resolution
    pub fn from_fixed_nanos<F: Into<I96F32>>(nanos: F) -> Self {
        Self {
            inner: nanos.into(),
        }
    }

    /// Create an instance from an [`Interval`], `2^log_2` seconds
    pub fn from_interval(interval: Interval) -> Self {
        let seconds = interval.seconds();
        Self::from_fixed_nanos(I96F32::from_num(seconds * 1e9))
    }

    /// Get the total amount of nanoseconds
    pub fn nanos(&self) -> I96F32 {
        self.inner
    }

    /// Get the total amount of nanoseconds, losing the fractional part
    pub fn nanos_rounded(&self) -> i128 {
        self.nanos().round().az::<i128>()
    }

    /// Get the total amount of nanoseconds as a float, possibly losing
    /// precision
    pub fn nanos_lossy(&self) -> f64 {
        self.nanos().az::<f64>()
    }

    /// Get the total amount of seconds, losing the sub-second part
    pub fn secs(&self) -> i64 {
        (self.inner / 1_000_000_000).to_num()
    }

    /// Absolute value of the duration
    pub fn abs(self) -> Duration {
        Duration::from_fixed_nanos(self.nanos().abs())
    }

    /// Clamp the duration between a minimum and maximum
    pub fn clamp(self, min: Duration, max: Duration) -> Duration {
        Ord::clamp(self, min, max)
    }

    pub(crate) fn from_interval_bits(bits: i64) -> Self {
        // TimeInterval carries nanoseconds in Q48.16; widen to our Q96.32
        let inner = I96F32::from_bits((bits as i128) << 16);
        Self { inner }
    }

    pub(crate) fn to_interval_bits(self) -> i64 {
        (self.inner.to_bits() >> 16) as i64
    }
}

impl From<TimeInterval> for Duration {
    fn from(interval: TimeInterval) -> Self {
        Self::from_interval_bits(interval.0.to_bits())
    }
}

impl Display for Duration {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}ns", self.nanos())
    }
}

impl Neg for Duration {
    type Output = Duration;

    fn neg(self) -> Self::Output {
        Self { inner: -self.inner }
    }
}

impl Add for Duration {
    type Output = Duration;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            inner: self.inner + rhs.inner,
        }
    }
}

impl AddAssign for Duration {
    fn add_assign(&mut self, rhs: Self) {
        self.inner += rhs.inner;
    }
}

impl Sub for Duration {
    type Output = Duration;

    fn sub(self, rhs: Self) -> Self::Output {
        Self {
            inner: self.inner - rhs.inner,
        }
    }
}

impl SubAssign for Duration {
    fn sub_assign(&mut self, rhs: Self) {
        self.inner -= rhs.inner;
    }
}

impl<T: Into<I96F32>> Mul<T> for Duration {
    type Output = Duration;

    fn mul(self, rhs: T) -> Self::Output {
        Self {
            inner: self.inner * rhs.into(),
        }
    }
}

impl<T: Into<I96F32>> Div<T> for Duration {
    type Output = Duration;

    fn div(self, rhs: T) -> Self::Output {
        Self {
            inner: self.inner / rhs.into(),
        }
    }
}
