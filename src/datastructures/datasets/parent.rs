use crate::datastructures::common::{ClockIdentity, ClockQuality, PortIdentity, TimeSource};

/// Information about the currently selected grandmaster of a domain
///
/// See *IEEE 802.1AS-2021 section 14.4*.
#[derive(Debug, Clone, Copy)]
pub struct ParentDS {
    /// The port of the master this system listens to, our own identity with
    /// port 0 when we are grandmaster
    pub parent_port_identity: PortIdentity,
    /// The identity of the domain's grandmaster
    pub grandmaster_identity: ClockIdentity,
    /// The advertised quality of the grandmaster
    pub grandmaster_clock_quality: ClockQuality,
    /// The advertised first priority field of the grandmaster
    pub grandmaster_priority_1: u8,
    /// The advertised second priority field of the grandmaster
    pub grandmaster_priority_2: u8,
    /// The advertised origin of the distributed time
    pub time_source: TimeSource,
}

impl ParentDS {
    pub(crate) fn new(default_ds: &super::DefaultDS) -> Self {
        Self {
            parent_port_identity: PortIdentity {
                clock_identity: default_ds.clock_identity,
                port_number: 0,
            },
            grandmaster_identity: default_ds.clock_identity,
            grandmaster_clock_quality: default_ds.clock_quality,
            grandmaster_priority_1: default_ds.priority_1,
            grandmaster_priority_2: default_ds.priority_2,
            time_source: TimeSource::InternalOscillator,
        }
    }
}
