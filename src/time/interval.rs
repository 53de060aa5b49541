#[allow(unused_imports)]
use crate::float_polyfill::FloatPolyfill;

/// A log2 representation of seconds used to describe the pacing of events in
/// gPTP
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Interval(i8);

impl core::fmt::Debug for Interval {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Interval")
            .field("seconds", &self.as_f64())
            .field("log_base_2", &self.0)
            .finish()
    }
}

impl Interval {
    /// An Interval of one second, the default announce and pdelay pacing
    pub const ONE_SECOND: Self = Self(0);

    /// An Interval of 125 milliseconds, the default sync pacing
    pub const EIGHT_PER_SECOND: Self = Self(-3);

    /// Construct an [`Interval`] from log2 seconds
    pub const fn from_log_2(log_2: i8) -> Self {
        Self(log_2)
    }

    /// Turn `self` into a number of seconds as [`f64`]
    pub fn seconds(self) -> f64 {
        self.as_f64()
    }

    /// Turn this into a [`Duration`](`crate::time::Duration`)
    pub fn as_duration(self) -> super::Duration {
        super::Duration::from_interval(self)
    }

    /// The length of this interval in nanoseconds
    pub fn nanos(self) -> f64 {
        self.as_f64() * 1e9
    }

    fn as_f64(self) -> f64 {
        2.0f64.powi(self.0 as i32)
    }

    /// Get the log2 of the number of seconds of this [`Interval`]
    pub fn as_log_2(self) -> i8 {
        self.0
    }
}

impl From<i8> for Interval {
    fn from(value: i8) -> Self {
        Self::from_log_2(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::Duration;

    #[test]
    fn defaults() {
        assert_eq!(Interval::ONE_SECOND.as_duration(), Duration::from_secs(1));
        assert_eq!(
            Interval::EIGHT_PER_SECOND.as_duration(),
            Duration::from_millis(125)
        );
    }

    #[test]
    fn nanos() {
        assert_eq!(Interval::from_log_2(-3).nanos(), 125_000_000.0);
        assert_eq!(Interval::from_log_2(1).nanos(), 2_000_000_000.0);
    }
}
