//! Definitions of the abstract clock interface

use crate::time::{Duration, Time};

/// Clock manipulation and querying interface
///
/// The clock trait is the primary way this crate interfaces with the
/// hardware clock that is being synchronized. Its implementation should be
/// provided by the user of the crate; the timestamps it produces must live
/// in the same timestamp domain as the receive and transmit timestamps the
/// transport supplies.
pub trait Clock {
    /// Type of the error the methods of this [`Clock`] may return
    type Error: core::fmt::Debug;

    /// Get the current time of the clock
    fn now(&self) -> Time;

    /// Set the frequency offset of the clock in parts per billion.
    ///
    /// The hardware may clamp the requested value; the applied value is
    /// returned.
    fn adjust_frequency(&mut self, ppb: f64) -> Result<f64, Self::Error>;

    /// Step the clock by the given offset
    fn adjust_phase(&mut self, offset: Duration) -> Result<(), Self::Error>;
}

#[cfg(feature = "std")]
impl<T: Clock + ?Sized> Clock for std::boxed::Box<T> {
    type Error = T::Error;

    fn now(&self) -> Time {
        self.as_ref().now()
    }

    fn adjust_frequency(&mut self, ppb: f64) -> Result<f64, Self::Error> {
        self.as_mut().adjust_frequency(ppb)
    }

    fn adjust_phase(&mut self, offset: Duration) -> Result<(), Self::Error> {
        self.as_mut().adjust_phase(offset)
    }
}
