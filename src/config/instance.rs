use crate::config::{ClockIdentity, ClockQuality};

/// Immutable configuration of a gPTP instance
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InstanceConfig {
    /// The identity of this time-aware system, commonly derived from a mac
    /// address
    pub clock_identity: ClockIdentity,
    /// First BMCA priority field, default 248
    pub priority_1: u8,
    /// Second BMCA priority field, default 248
    pub priority_2: u8,
    /// The quality advertised when this system is grandmaster
    pub clock_quality: ClockQuality,
    /// When false the instance never becomes grandmaster: priority 1 and the
    /// clock class are forced to 255
    pub grandmaster_capable: bool,
}

impl InstanceConfig {
    /// A configuration with the gPTP default priorities for the given
    /// identity
    pub fn new(clock_identity: ClockIdentity) -> Self {
        Self {
            clock_identity,
            priority_1: 248,
            priority_2: 248,
            clock_quality: ClockQuality::default(),
            grandmaster_capable: true,
        }
    }
}
