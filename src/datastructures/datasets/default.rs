use crate::{
    config::InstanceConfig,
    datastructures::common::{ClockIdentity, ClockQuality},
};

/// The static description of the local clock in one domain
///
/// See *IEEE 802.1AS-2021 section 14.2*.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DefaultDS {
    /// The identity of this time-aware system
    pub clock_identity: ClockIdentity,
    /// The quality advertised when this system is grandmaster
    pub clock_quality: ClockQuality,
    /// First BMCA priority field, 255 means not grandmaster-capable
    pub priority_1: u8,
    /// Second BMCA priority field
    pub priority_2: u8,
    /// The domain this data set belongs to
    pub domain_number: u8,
}

impl DefaultDS {
    pub(crate) fn new(config: InstanceConfig, domain_number: u8) -> Self {
        let (priority_1, clock_quality) = if config.grandmaster_capable {
            (config.priority_1, config.clock_quality)
        } else {
            // A slave-only system advertises the worst possible clock
            (
                255,
                ClockQuality {
                    clock_class: 255,
                    ..config.clock_quality
                },
            )
        };

        Self {
            clock_identity: config.clock_identity,
            clock_quality,
            priority_1,
            priority_2: config.priority_2,
            domain_number,
        }
    }
}
