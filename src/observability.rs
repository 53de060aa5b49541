//! Read only snapshots of the instance state for reporting

use arrayvec::ArrayVec;

use crate::{
    config::ClockIdentity,
    instance::InstanceStatistics,
    port::{PortRole, PortStatistics},
    MAX_DOMAINS, MAX_PORTS,
};

/// Everything an operator wants to see about one port
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PortStatus {
    /// The number of the port
    pub port_number: u16,
    /// The role the election gave the port
    pub role: PortRole,
    /// Whether peer delay measurement declared the link usable
    pub as_capable: bool,
    /// The filtered one way delay of the link in nanoseconds
    pub mean_link_delay_ns: Option<i64>,
    /// The rate of the neighbor clock relative to ours
    pub neighbor_rate_ratio: f64,
    /// Drop and error counters
    pub statistics: PortStatistics,
}

/// The state of the servo of one domain
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ServoStatus {
    /// Whether the servo is locked to its master
    pub locked: bool,
    /// The frequency adjustment the servo asked for, in parts per billion
    pub frequency_adjustment_ppb: f64,
    /// The frequency adjustment the hardware actually runs at
    pub applied_frequency_ppb: f64,
    /// Running mean of the measured offsets in nanoseconds
    pub mean_offset_ns: f64,
    /// Running standard deviation of the measured offsets in nanoseconds
    pub offset_std_dev_ns: f64,
    /// Amount of accepted measurements
    pub sample_count: u64,
    /// Amount of measurements discarded as outliers
    pub outliers_rejected: u32,
}

/// The synchronization state of one domain
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DomainStatus {
    /// The domain this entry describes
    pub domain_number: u8,
    /// The elected grandmaster of the domain
    pub grandmaster_identity: ClockIdentity,
    /// Whether the grandmaster is this system itself
    pub local_is_grandmaster: bool,
    /// How many links separate us from the grandmaster
    pub steps_removed: u16,
    /// The most recent offset measurement in nanoseconds
    pub offset_from_master_ns: i64,
    /// The servo of the domain
    pub servo: ServoStatus,
}

/// A full snapshot of a [`GptpInstance`](`crate::GptpInstance`)
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InstanceStatus {
    /// Frame level drop counters
    pub statistics: InstanceStatistics,
    /// One entry per port
    pub ports: ArrayVec<PortStatus, MAX_PORTS>,
    /// One entry per domain
    pub domains: ArrayVec<DomainStatus, MAX_DOMAINS>,
}
