use crate::time::Duration;

/// Dynamic synchronization state of one domain
///
/// See *IEEE 802.1AS-2021 section 14.3*.
#[derive(Debug, Clone, Copy, Default)]
pub struct CurrentDS {
    /// The number of links between this system and the grandmaster
    pub steps_removed: u16,
    /// The most recent measured offset to the grandmaster
    pub offset_from_master: Duration,
}
